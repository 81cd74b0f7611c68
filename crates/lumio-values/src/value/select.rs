use super::{format_unknown, is_truthy, raw_text, TypedValue};
use crate::text::unescape_html;
use lumio_model::{ConditionType, ConditionValue, ConstraintData, SelectConstraintConfig, SelectOption};
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

/// One or more options of a select list. A referenced selection list in the
/// context replaces the configured options.
#[derive(Debug, Clone)]
pub struct SelectDataValue<'a> {
    raw: Value,
    input: Option<String>,
    config: Cow<'a, SelectConstraintConfig>,
    data: &'a ConstraintData,
    options: Vec<SelectOption>,
}

impl<'a> SelectDataValue<'a> {
    pub fn new(
        raw: Value,
        config: &'a SelectConstraintConfig,
        data: &'a ConstraintData,
        input: Option<&str>,
    ) -> Self {
        let config = resolve_selection_list(config, data);
        let current = match input {
            Some(text) => Value::String(text.to_string()),
            None => raw.clone(),
        };
        let options = find_options(&config, &current, input.is_none());
        Self {
            raw,
            input: input.map(str::to_string),
            config,
            data,
            options,
        }
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn config(&self) -> &SelectConstraintConfig {
        &self.config
    }

    fn values(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.value.as_str())
    }

    fn with_config(&self, raw: Value, input: Option<&str>) -> Self {
        let options = find_options(
            &self.config,
            &input.map_or_else(|| raw.clone(), |i| Value::String(i.to_string())),
            input.is_none(),
        );
        Self {
            raw,
            input: input.map(str::to_string),
            config: self.config.clone(),
            data: self.data,
            options,
        }
    }

    fn shift(&self, delta: isize) -> Option<Self> {
        let first = self.options.first()?;
        let options = &self.config.options;
        if options.is_empty() {
            return None;
        }
        let len = options.len() as isize;
        let next = match options.iter().position(|o| o.value == first.value) {
            Some(index) => (index as isize + delta).rem_euclid(len) as usize,
            None => 0,
        };
        Some(self.copy_with(Value::String(options[next].value.clone())))
    }

    fn other_options(&self, values: &[ConditionValue]) -> Vec<SelectOption> {
        values
            .first()
            .map(|v| self.copy_with(v.raw().clone()).options)
            .unwrap_or_default()
    }
}

fn resolve_selection_list<'a>(
    config: &'a SelectConstraintConfig,
    data: &'a ConstraintData,
) -> Cow<'a, SelectConstraintConfig> {
    let list = config
        .selection_list_id
        .as_deref()
        .and_then(|id| data.find_selection_list(id));
    match list {
        Some(list) => Cow::Owned(SelectConstraintConfig {
            display_values: list.display_values,
            options: list.options.clone(),
            ..config.clone()
        }),
        None => Cow::Borrowed(config),
    }
}

/// Options matching the stored values; unknown values are kept as plain
/// options when `show_invalid` is set.
fn find_options(config: &SelectConstraintConfig, value: &Value, show_invalid: bool) -> Vec<SelectOption> {
    let values: Vec<String> = match value {
        Value::Array(items) => items.iter().map(raw_text).collect(),
        other => vec![raw_text(other)],
    };
    values
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .filter_map(|v| match config.options.iter().find(|o| o.value == v) {
            Some(option) => Some(SelectOption {
                display_value: if config.display_values {
                    option.display_value.clone()
                } else {
                    Some(option.value.clone())
                },
                ..option.clone()
            }),
            None if show_invalid => Some(SelectOption::new(v.clone(), Some(v.as_str()))),
            None => None,
        })
        .collect()
}

impl<'a> TypedValue for SelectDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        if self.options.is_empty() {
            return format_unknown(&self.raw);
        }
        self.options
            .iter()
            .map(|o| match (&o.display_value, self.config.display_values) {
                (Some(display), true) if !display.is_empty() => display.as_str(),
                _ => o.value.as_str(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn edit_value(&self) -> String {
        match self.serialize() {
            Value::Array(values) => values
                .iter()
                .map(raw_text)
                .collect::<Vec<_>>()
                .join(","),
            other => unescape_html(&raw_text(&other)),
        }
    }

    fn serialize(&self) -> Value {
        if self.config.multi {
            return Value::Array(self.values().map(|v| Value::String(v.to_string())).collect());
        }
        self.options
            .first()
            .map_or(Value::Null, |o| Value::String(o.value.clone()))
    }

    fn is_valid(&self, _ignore_config: bool) -> bool {
        if self.input.is_some() {
            return true;
        }
        if !is_truthy(&self.raw) {
            return true;
        }
        self.options
            .iter()
            .all(|option| self.config.options.iter().any(|o| o.value == option.value))
    }

    fn increment(&self) -> Option<Self> {
        self.shift(1)
    }

    fn decrement(&self) -> Option<Self> {
        self.shift(-1)
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        if self.options.len() > 1 || other.options.len() > 1 {
            return Ordering::Equal;
        }
        let index = |value: &Self| {
            value
                .options
                .first()
                .and_then(|first| self.config.options.iter().position(|o| o.value == first.value))
                .map_or(-1, |i| i as isize)
        };
        index(self).cmp(&index(other))
    }

    fn copy_with(&self, raw: Value) -> Self {
        self.with_config(raw, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        self.with_config(self.raw.clone(), Some(input))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let others = self.other_options(values);
        let in_others = |value: &str| others.iter().any(|o| o.value == value);
        match condition {
            ConditionType::HasSome | ConditionType::Equals => self.values().any(in_others),
            ConditionType::HasNoneOf | ConditionType::NotEquals => !self.values().any(in_others),
            ConditionType::In => !self.options.is_empty() && self.values().all(in_others),
            ConditionType::HasAll => others
                .iter()
                .all(|other| self.values().any(|v| v == other.value)),
            ConditionType::IsEmpty => self.options.is_empty() && self.format().trim().is_empty(),
            ConditionType::NotEmpty => !self.options.is_empty() || !self.format().trim().is_empty(),
            _ => false,
        }
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        let others = self.other_options(values);
        let first_of = |options: &[SelectOption]| {
            options
                .first()
                .map_or(Value::Null, |o| Value::String(o.value.clone()))
        };
        match condition {
            ConditionType::HasSome | ConditionType::Equals | ConditionType::In => first_of(&others),
            ConditionType::HasAll => values.first().map_or(Value::Null, |v| v.raw().clone()),
            ConditionType::HasNoneOf | ConditionType::NotEquals => {
                let remaining: Vec<SelectOption> = self
                    .config
                    .options
                    .iter()
                    .filter(|o| !others.iter().any(|other| other.value == o.value))
                    .cloned()
                    .collect();
                first_of(&remaining)
            }
            ConditionType::IsEmpty => Value::String(String::new()),
            ConditionType::NotEmpty => first_of(&self.config.options),
            _ => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumio_model::SelectionList;
    use serde_json::json;

    fn config(multi: bool) -> SelectConstraintConfig {
        SelectConstraintConfig {
            multi,
            display_values: true,
            options: vec![
                SelectOption::new("a", Some("Alpha")),
                SelectOption::new("b", Some("Beta")),
                SelectOption::new("c", None),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn formats_display_values() {
        let config = config(true);
        let data = ConstraintData::default();
        let v = SelectDataValue::new(json!(["a", "c", "x"]), &config, &data, None);
        assert_eq!(v.format(), "Alpha, c, x");
        assert_eq!(v.serialize(), json!(["a", "c", "x"]));
        assert!(!v.is_valid(false));
    }

    #[test]
    fn cycles_through_options() {
        let config = config(false);
        let data = ConstraintData::default();
        let v = SelectDataValue::new(json!("c"), &config, &data, None);
        assert_eq!(v.increment().map(|n| n.serialize()), Some(json!("a")));
        assert_eq!(v.decrement().map(|n| n.serialize()), Some(json!("b")));
        let empty = SelectDataValue::new(Value::Null, &config, &data, None);
        assert!(empty.increment().is_none());
    }

    #[test]
    fn selection_list_overrides_options() {
        let config = SelectConstraintConfig {
            selection_list_id: Some("list1".to_string()),
            ..Default::default()
        };
        let data = ConstraintData {
            selection_lists: vec![SelectionList {
                id: "list1".to_string(),
                display_values: true,
                options: vec![SelectOption::new("1", Some("One"))],
                ..Default::default()
            }],
            ..Default::default()
        };
        let v = SelectDataValue::new(json!(1), &config, &data, None);
        assert_eq!(v.format(), "One");
        assert!(v.is_valid(false));
    }
}
