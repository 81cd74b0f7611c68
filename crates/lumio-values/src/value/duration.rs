use super::{
    format_unknown, is_truthy, meets_condition_by_number, value_by_condition_number, TypedValue,
};
use crate::decimal::{decimal_to_json, parse_decimal, plain_string, round_half_up};
use crate::duration_units::{duration_millis, duration_text, format_millis, unit_to_millis};
use crate::text::{escape_html, unescape_html};
use bigdecimal::BigDecimal;
use lumio_model::{ConditionType, ConditionValue, ConstraintData, DurationConstraintConfig, DurationUnit};
use serde_json::Value;
use std::cmp::Ordering;

/// Durations are stored in milliseconds; typed numbers are seconds and typed
/// text uses unit letters (`1w2d`).
#[derive(Debug, Clone)]
pub struct DurationDataValue<'a> {
    raw: Value,
    input: Option<String>,
    config: &'a DurationConstraintConfig,
    data: &'a ConstraintData,
    parsed: Value,
    number: Option<BigDecimal>,
    rounded: Option<BigDecimal>,
}

impl<'a> DurationDataValue<'a> {
    pub fn new(
        raw: Value,
        config: &'a DurationConstraintConfig,
        data: &'a ConstraintData,
        input: Option<&str>,
    ) -> Self {
        let parsed = match input.filter(|i| !i.is_empty()) {
            Some(text) => match parse_decimal(text) {
                Some(seconds) => Value::String(plain_string(&(seconds * BigDecimal::from(1000)))),
                None => Value::String(text.to_string()),
            },
            None => raw.clone(),
        };
        let number = duration_text(&parsed)
            .and_then(|text| duration_millis(&text, config, Some(&data.duration_units_map)));
        let rounded = number
            .as_ref()
            .map(|n| round_half_up(n, config.decimal_places.unwrap_or(0)));
        Self {
            raw,
            input: input.map(str::to_string),
            config,
            data,
            parsed,
            number,
            rounded,
        }
    }

    /// Milliseconds.
    pub fn number(&self) -> Option<&BigDecimal> {
        self.number.as_ref()
    }

    /// Moves by one of the smallest unit shown in the native rendering.
    fn add_to_smallest_unit(&self, sign: i32) -> Option<Self> {
        let number = self.number.as_ref()?;
        let native = format_millis(number, self.config, None);
        let step = DurationUnit::ALL
            .iter()
            .rev()
            .filter(|unit| native.contains(unit.letter()))
            .map(|unit| unit_to_millis(self.config, *unit))
            .find(|millis| number.abs() >= *millis);
        Some(match step {
            Some(millis) => {
                let moved = number.clone() + millis * BigDecimal::from(sign);
                self.copy_with(Value::String(plain_string(&moved)))
            }
            None => self.clone(),
        })
    }
}

impl<'a> TypedValue for DurationDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        match &self.number {
            Some(number) => format_millis(number, self.config, Some(&self.data.duration_units_map)),
            None => format_unknown(&self.raw),
        }
    }

    fn edit_value(&self) -> String {
        unescape_html(&self.format())
    }

    fn serialize(&self) -> Value {
        match &self.number {
            Some(number) => decimal_to_json(&round_half_up(number, 0)),
            None => Value::String(escape_html(&format_unknown(&self.raw))),
        }
    }

    fn is_valid(&self, ignore_config: bool) -> bool {
        if let Some(input) = &self.input {
            return self
                .copy_with(Value::String(input.clone()))
                .is_valid(ignore_config);
        }
        self.number.is_some() || !is_truthy(&self.raw)
    }

    fn increment(&self) -> Option<Self> {
        self.add_to_smallest_unit(1)
    }

    fn decrement(&self) -> Option<Self> {
        self.add_to_smallest_unit(-1)
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        self.rounded.cmp(&other.rounded)
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, self.config, self.data, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), self.config, self.data, Some(input))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let others: Vec<Self> = values.iter().map(|v| self.copy_with(v.raw().clone())).collect();
        let numbers: Vec<Option<BigDecimal>> = others.iter().map(|o| o.rounded.clone()).collect();
        let parsed: Vec<Value> = others.into_iter().map(|o| o.parsed).collect();
        meets_condition_by_number(condition, self.rounded.as_ref(), &numbers, &self.parsed, &parsed)
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        value_by_condition_number(self, condition, values, "19s")
    }
}
