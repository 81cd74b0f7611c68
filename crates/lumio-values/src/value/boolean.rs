use super::{raw_text, TypedValue};
use lumio_model::{ConditionType, ConditionValue};
use serde_json::Value;
use std::cmp::Ordering;

/// A checkbox.
#[derive(Debug, Clone)]
pub struct BooleanDataValue {
    raw: Value,
    checked: bool,
}

/// `true`, `"true"`, `"1"`, `"yes"` and `"on"` (any case) are checked.
pub fn is_checked(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(_) => raw_text(value) == "1",
        Value::String(text) => matches!(
            text.trim().to_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => false,
    }
}

impl BooleanDataValue {
    pub fn new(raw: Value) -> Self {
        let checked = is_checked(&raw);
        Self { raw, checked }
    }

    pub fn checked(&self) -> bool {
        self.checked
    }
}

impl TypedValue for BooleanDataValue {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        self.checked.to_string()
    }

    fn serialize(&self) -> Value {
        Value::Bool(self.checked)
    }

    fn is_valid(&self, _ignore_config: bool) -> bool {
        true
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        self.checked.cmp(&other.checked)
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let other = values.first().is_some_and(|v| is_checked(v.raw()));
        match condition {
            ConditionType::Equals => self.checked == other,
            ConditionType::NotEquals => self.checked != other,
            _ => false,
        }
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        let other = values.first().is_some_and(|v| is_checked(v.raw()));
        match condition {
            ConditionType::Equals => Value::Bool(other),
            ConditionType::NotEquals => Value::Bool(!other),
            _ => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loose_truthiness() {
        for raw in [json!(true), json!("TRUE"), json!("1"), json!(1), json!("yes"), json!("on")] {
            assert!(is_checked(&raw), "{raw}");
        }
        for raw in [json!(false), json!("no"), json!(0), Value::Null, json!("")] {
            assert!(!is_checked(&raw), "{raw}");
        }
    }

    #[test]
    fn equality_conditions() {
        let v = BooleanDataValue::new(json!("on"));
        assert!(v.meet_condition(ConditionType::Equals, &[ConditionValue::literal(true)]));
        assert!(v.meet_condition(ConditionType::NotEquals, &[ConditionValue::literal("false")]));
        assert_eq!(v.serialize(), json!(true));
    }
}
