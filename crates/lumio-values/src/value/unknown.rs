use super::{
    format_unknown, meets_condition_by_text, normalize_text, value_by_condition_text, TypedValue,
};
use crate::decimal::parse_decimal;
use crate::text::{escape_html, unescape_html};
use lumio_model::{ConditionType, ConditionValue};
use serde_json::Value;
use std::cmp::Ordering;

/// A raw value of an attribute without a constraint.
#[derive(Debug, Clone)]
pub struct UnknownDataValue {
    raw: Value,
    input: Option<String>,
}

impl UnknownDataValue {
    pub fn new(raw: Value, input: Option<&str>) -> Self {
        Self {
            raw,
            input: input.map(str::to_string),
        }
    }
}

impl TypedValue for UnknownDataValue {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        match &self.input {
            Some(input) => input.clone(),
            None => format_unknown(&self.raw),
        }
    }

    fn edit_value(&self) -> String {
        unescape_html(&self.format())
    }

    fn serialize(&self) -> Value {
        match &self.raw {
            Value::String(text) => Value::String(escape_html(text)),
            other => other.clone(),
        }
    }

    fn is_valid(&self, _ignore_config: bool) -> bool {
        true
    }

    /// Numerically when both sides read as numbers.
    fn compare_to(&self, other: &Self) -> Ordering {
        let (a, b) = (self.format(), other.format());
        match (parse_decimal(&a), parse_decimal(&b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.cmp(&b),
        }
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), None)
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let others: Vec<String> = values
            .iter()
            .map(|v| normalize_text(&format_unknown(v.raw())))
            .collect();
        meets_condition_by_text(condition, &normalize_text(&self.format()), &others)
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        value_by_condition_text(condition, values, "a")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_text_compares_numerically() {
        let nine = UnknownDataValue::new(json!("9"), None);
        let ten = UnknownDataValue::new(json!(10), None);
        assert_eq!(nine.compare_to(&ten), Ordering::Less);
        let b = UnknownDataValue::new(json!("b"), None);
        assert_eq!(b.compare_to(&nine), Ordering::Greater);
    }

    #[test]
    fn text_conditions_on_formatted_value() {
        let v = UnknownDataValue::new(json!(["Alpha", "Beta"]), None);
        assert_eq!(v.format(), "Alpha, Beta");
        assert!(v.meet_condition(ConditionType::Contains, &[ConditionValue::literal("BETA")]));
        assert!(v.meet_condition(ConditionType::NotEmpty, &[]));
        assert_eq!(v.serialize(), json!(["Alpha", "Beta"]));
    }
}
