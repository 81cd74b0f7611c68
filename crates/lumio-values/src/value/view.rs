use super::{meets_condition_by_ids, raw_text, value_by_condition_ids, TypedValue};
use lumio_model::{ConditionType, ConditionValue, ConstraintData, View, ViewConstraintConfig};
use serde_json::Value;
use std::cmp::Ordering;

/// Saved views referenced by id. Unknown ids are kept with an empty name.
#[derive(Debug, Clone)]
pub struct ViewDataValue<'a> {
    raw: Value,
    input: Option<String>,
    config: &'a ViewConstraintConfig,
    data: &'a ConstraintData,
    views: Vec<View>,
}

impl<'a> ViewDataValue<'a> {
    pub fn new(
        raw: Value,
        config: &'a ViewConstraintConfig,
        data: &'a ConstraintData,
        input: Option<&str>,
    ) -> Self {
        let ids: Vec<String> = match &raw {
            Value::Array(items) => items.iter().map(raw_text).collect(),
            other => vec![raw_text(other)],
        };
        let views = ids
            .into_iter()
            .filter(|id| !id.trim().is_empty())
            .map(|id| {
                data.find_view(&id).cloned().unwrap_or(View {
                    id,
                    name: String::new(),
                })
            })
            .collect();
        Self {
            raw,
            input: input.map(str::to_string),
            config,
            data,
            views,
        }
    }

    fn ids(&self) -> Vec<String> {
        self.views.iter().map(|v| v.id.clone()).collect()
    }

    fn operand_ids(&self, values: &[ConditionValue]) -> Vec<String> {
        values
            .first()
            .map(|v| self.copy_with(v.raw().clone()).ids())
            .unwrap_or_default()
    }
}

impl<'a> TypedValue for ViewDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        self.views
            .iter()
            .map(|v| v.name.as_str())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn serialize(&self) -> Value {
        if self.config.multi {
            return Value::Array(self.ids().into_iter().map(Value::String).collect());
        }
        self.views
            .first()
            .map_or(Value::Null, |v| Value::String(v.id.clone()))
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
        meets_condition_by_ids(condition, &self.ids(), &self.operand_ids(values), &self.format())
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        let known: Vec<String> = self.data.views.iter().map(|v| v.id.clone()).collect();
        value_by_condition_ids(condition, values, &self.operand_ids(values), &known)
    }
}
