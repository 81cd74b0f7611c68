use super::{format_unknown, is_truthy, meets_fulltexts, TypedValue};
use crate::text::{escape_html, unescape_html};
use lumio_model::{ConditionType, ConditionValue};
use serde_json::Value;
use std::cmp::Ordering;

/// Names of attached files. Only emptiness can be queried.
#[derive(Debug, Clone)]
pub struct FilesDataValue {
    raw: Value,
}

impl FilesDataValue {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }
}

impl TypedValue for FilesDataValue {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        format_unknown(&self.raw)
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

    fn compare_to(&self, other: &Self) -> Ordering {
        self.format().cmp(&other.format())
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()))
    }

    fn meet_condition(&self, condition: ConditionType, _values: &[ConditionValue]) -> bool {
        match condition {
            ConditionType::IsEmpty => !is_truthy(&self.raw),
            ConditionType::NotEmpty => is_truthy(&self.raw),
            _ => false,
        }
    }

    fn meet_full_texts(&self, fulltexts: &[String]) -> bool {
        meets_fulltexts(&self.format(), fulltexts)
    }

    fn value_by_condition(&self, condition: ConditionType, _values: &[ConditionValue]) -> Value {
        match condition {
            ConditionType::IsEmpty => Value::String(String::new()),
            ConditionType::NotEmpty => Value::String("a".to_string()),
            _ => Value::Null,
        }
    }
}
