use super::TypedValue;
use lumio_model::{ActionConstraintConfig, ConditionType, ConditionValue};
use serde_json::Value;
use std::cmp::Ordering;

/// A button attribute. It stores nothing; whether it is enabled is decided by
/// the attribute lock evaluation, not by the value itself.
#[derive(Debug, Clone)]
pub struct ActionDataValue<'a> {
    raw: Value,
    config: &'a ActionConstraintConfig,
}

impl<'a> ActionDataValue<'a> {
    pub fn new(raw: Value, config: &'a ActionConstraintConfig) -> Self {
        Self { raw, config }
    }

    pub fn config(&self) -> &ActionConstraintConfig {
        self.config
    }
}

impl<'a> TypedValue for ActionDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        self.config.title.clone().unwrap_or_default()
    }

    fn serialize(&self) -> Value {
        Value::Null
    }

    fn is_valid(&self, _ignore_config: bool) -> bool {
        true
    }

    fn compare_to(&self, _other: &Self) -> Ordering {
        Ordering::Equal
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, self.config)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), self.config)
    }

    fn meet_condition(&self, _condition: ConditionType, _values: &[ConditionValue]) -> bool {
        false
    }

    fn value_by_condition(&self, _condition: ConditionType, _values: &[ConditionValue]) -> Value {
        Value::Null
    }
}
