use super::{
    format_unknown, is_truthy, meets_condition_by_text, meets_fulltexts, normalize_text,
    value_by_condition_text, TypedValue,
};
use crate::text::{strip_html_tags, transform_case_style, unescape_html, unwrap_single_paragraph};
use lumio_model::{ConditionType, ConditionValue, TextConstraintConfig};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

/// Free (possibly rich) text. Conditions and length limits apply to the text
/// without HTML tags.
#[derive(Debug, Clone)]
pub struct TextDataValue<'a> {
    raw: Value,
    input: Option<String>,
    config: &'a TextConstraintConfig,
}

impl<'a> TextDataValue<'a> {
    pub fn new(raw: Value, config: &'a TextConstraintConfig, input: Option<&str>) -> Self {
        Self {
            raw,
            input: input.map(|i| i.replace('\u{a0}', " ")),
            config,
        }
    }

    fn plain(&self) -> String {
        strip_html_tags(&self.format())
    }

    fn matches_regexp(&self, text: &str) -> bool {
        match self.config.regexp.as_deref().filter(|p| !p.is_empty()) {
            Some(pattern) => Regex::new(pattern).ok().map_or(true, |re| re.is_match(text)),
            None => true,
        }
    }
}

impl<'a> TypedValue for TextDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        match &self.raw {
            Value::String(text) => transform_case_style(text, self.config.case_style),
            other => format_unknown(other),
        }
    }

    fn title(&self) -> String {
        unescape_html(&self.plain())
    }

    fn edit_value(&self) -> String {
        self.format()
    }

    fn serialize(&self) -> Value {
        let formatted = self.format();
        Value::String(unwrap_single_paragraph(&formatted).to_string())
    }

    fn is_valid(&self, ignore_config: bool) -> bool {
        if let Some(input) = &self.input {
            return self
                .copy_with(Value::String(input.clone()))
                .is_valid(ignore_config);
        }
        if !is_truthy(&self.raw) || ignore_config {
            return true;
        }
        let plain = self.plain();
        let length = plain.chars().count();
        let long_enough = self.config.min_length.map_or(true, |min| length >= min);
        let short_enough = self.config.max_length.map_or(true, |max| length <= max);
        long_enough && short_enough && self.matches_regexp(&plain)
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        self.plain().cmp(&other.plain())
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, self.config, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), self.config, Some(input))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let others: Vec<String> = values
            .iter()
            .map(|v| normalize_text(&self.copy_with(v.raw().clone()).plain()))
            .collect();
        meets_condition_by_text(condition, &normalize_text(&self.plain()), &others)
    }

    fn meet_full_texts(&self, fulltexts: &[String]) -> bool {
        meets_fulltexts(self.plain().trim(), fulltexts)
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        let stripped: Vec<ConditionValue> = values
            .iter()
            .map(|v| ConditionValue {
                kind: v.kind,
                value: v.value.as_ref().map(|raw| match raw {
                    Value::String(text) => Value::String(strip_html_tags(text)),
                    other => other.clone(),
                }),
            })
            .collect();
        value_by_condition_text(condition, &stripped, "a")
    }
}
