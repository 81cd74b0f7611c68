use super::{
    format_unknown, meets_condition_by_text, normalize_text, raw_text, value_by_condition_text,
    TypedValue,
};
use crate::text::unescape_html;
use lumio_model::{
    Address, AddressConstraintConfig, AddressField, ConditionType, ConditionValue, ConstraintData,
};
use serde_json::Value;
use std::cmp::Ordering;

const ALL_FIELDS: [AddressField; 8] = [
    AddressField::Street,
    AddressField::HouseNumber,
    AddressField::PostalCode,
    AddressField::City,
    AddressField::County,
    AddressField::State,
    AddressField::Country,
    AddressField::Continent,
];

/// A postal address. Stored text is resolved through the context's address
/// lookup; unresolved text is shown as typed.
#[derive(Debug, Clone)]
pub struct AddressDataValue<'a> {
    raw: Value,
    input: Option<String>,
    config: &'a AddressConstraintConfig,
    data: &'a ConstraintData,
    address: Option<Address>,
}

fn field_value(address: &Address, field: AddressField) -> Option<&str> {
    match field {
        AddressField::Street => address.street.as_deref(),
        AddressField::HouseNumber => address.house_number.as_deref(),
        AddressField::PostalCode => address.postal_code.as_deref(),
        AddressField::City => address.city.as_deref(),
        AddressField::County => address.county.as_deref(),
        AddressField::State => address.state.as_deref(),
        AddressField::Country => address.country.as_deref(),
        AddressField::Continent => address.continent.as_deref(),
    }
}

/// Joins the configured fields (all fields when none are configured).
pub fn format_address(address: &Address, fields: &[AddressField]) -> String {
    let fields = if fields.is_empty() { &ALL_FIELDS[..] } else { fields };
    fields
        .iter()
        .filter_map(|f| field_value(address, *f))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

impl<'a> AddressDataValue<'a> {
    pub fn new(
        raw: Value,
        config: &'a AddressConstraintConfig,
        data: &'a ConstraintData,
        input: Option<&str>,
    ) -> Self {
        let address = match &raw {
            Value::Object(_) => serde_json::from_value(raw.clone()).ok(),
            other => data
                .addresses_map
                .get(raw_text(other).trim())
                .and_then(|found| found.first())
                .cloned(),
        };
        Self {
            raw,
            input: input.map(str::to_string),
            config,
            data,
            address,
        }
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }
}

impl<'a> TypedValue for AddressDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        match &self.address {
            Some(address) => format_address(address, &self.config.fields),
            None => format_unknown(&self.raw),
        }
    }

    fn edit_value(&self) -> String {
        unescape_html(&self.format())
    }

    fn serialize(&self) -> Value {
        match &self.raw {
            Value::Null => Value::Null,
            raw => Value::String(raw_text(raw)),
        }
    }

    fn is_valid(&self, _ignore_config: bool) -> bool {
        true
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        self.format().cmp(&other.format())
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, self.config, self.data, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), self.config, self.data, Some(input))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let others: Vec<String> = values
            .iter()
            .map(|v| normalize_text(&self.copy_with(v.raw().clone()).format()))
            .collect();
        meets_condition_by_text(condition, &normalize_text(&self.format()), &others)
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        value_by_condition_text(condition, values, "a")
    }
}
