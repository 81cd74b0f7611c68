use super::{
    format_unknown, is_truthy, meets_condition_by_number, value_by_condition_number, TypedValue,
};
use crate::decimal::{
    decimal_from_json, decimal_user_to_store, one, parse_decimal, plain_string, round_half_up,
};
use crate::text::{escape_html, unescape_html};
use bigdecimal::BigDecimal;
use lumio_model::{
    ConditionType, ConditionValue, PercentageConstraintConfig, PercentageDisplayStyle,
};
use serde_json::Value;
use std::cmp::Ordering;

/// Percentages are stored as fractions (`0.5`) and displayed in percent
/// (`50%`). A stored string ending with `%` is read in percent units.
#[derive(Debug, Clone)]
pub struct PercentageDataValue<'a> {
    raw: Value,
    input: Option<String>,
    config: &'a PercentageConstraintConfig,
    /// The stored fraction after reading `%` suffixes.
    parsed: Value,
    /// Percent units, exact.
    number: Option<BigDecimal>,
    /// Percent units, rounded to the configured decimals.
    rounded: Option<BigDecimal>,
}

impl<'a> PercentageDataValue<'a> {
    pub fn new(raw: Value, config: &'a PercentageConstraintConfig, input: Option<&str>) -> Self {
        let has_sign = matches!(&raw, Value::String(s) if s.trim().ends_with('%'));
        let parsed = if has_sign || input.is_some() {
            parse_input_value(&format_unknown(&raw))
        } else {
            raw.clone()
        };
        let number = decimal_from_json(&parsed).map(|fraction| fraction * BigDecimal::from(100));
        let rounded = number.as_ref().map(|n| match config.decimals {
            Some(decimals) => round_half_up(n, decimals),
            None => n.clone(),
        });
        Self {
            raw,
            input: input.map(str::to_string),
            config,
            parsed,
            number,
            rounded,
        }
    }

    /// Percent units rounded to the configured precision.
    pub fn number(&self) -> Option<&BigDecimal> {
        self.rounded.as_ref()
    }

    fn format_with_suffix(&self, suffix: &str) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        match &self.rounded {
            Some(rounded) => format!("{}{}", plain_string(rounded), suffix),
            None => format_unknown(&self.raw),
        }
    }

    fn with_percent(&self, percent: BigDecimal) -> Self {
        let fraction = percent / BigDecimal::from(100);
        Self::new(Value::String(plain_string(&fraction)), self.config, None)
    }

    fn within_range(&self) -> bool {
        let Some(rounded) = &self.rounded else {
            return false;
        };
        let bound = |value: &Option<Value>| value.as_ref().and_then(decimal_from_json);
        let round = |n: BigDecimal| match self.config.decimals {
            Some(decimals) => round_half_up(&n, decimals),
            None => n,
        };
        let above_min = bound(&self.config.min_value).map_or(true, |min| rounded >= &round(min));
        let below_max = bound(&self.config.max_value).map_or(true, |max| rounded <= &round(max));
        above_min && below_max
    }
}

/// `"66%"` → `"0.66"`, `"66"` → `"0.66"`, `""` → `""`; anything else is kept.
fn parse_input_value(input: &str) -> Value {
    let text = decimal_user_to_store(input.trim());
    let numeric = match text.strip_suffix('%') {
        Some(prefix) => parse_decimal(prefix),
        None if text.is_empty() => return Value::String(String::new()),
        None => parse_decimal(&text),
    };
    match numeric {
        Some(percent) => Value::String(plain_string(&(percent / BigDecimal::from(100)))),
        None => Value::String(input.to_string()),
    }
}

impl<'a> TypedValue for PercentageDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        self.format_with_suffix("%")
    }

    fn title(&self) -> String {
        let title = unescape_html(&self.format());
        let style = self.config.style.unwrap_or(PercentageDisplayStyle::Text);
        if title.is_empty() && style == PercentageDisplayStyle::ProgressBar {
            return "0%".to_string();
        }
        title
    }

    fn edit_value(&self) -> String {
        unescape_html(&self.format_with_suffix(""))
    }

    fn serialize(&self) -> Value {
        let Some(number) = &self.number else {
            return if is_truthy(&self.raw) {
                Value::String(escape_html(&format_unknown(&self.raw)))
            } else {
                Value::String(String::new())
            };
        };
        let fraction = number.clone() / BigDecimal::from(100);
        let fraction = match self.config.decimals {
            Some(decimals) => round_half_up(&fraction, decimals + 2),
            None => fraction,
        };
        let text = plain_string(&fraction);
        match text.parse::<i64>() {
            Ok(int) if !text.contains('.') => Value::from(int),
            _ => Value::String(text),
        }
    }

    fn is_valid(&self, ignore_config: bool) -> bool {
        if !is_truthy(&self.raw) {
            return true;
        }
        self.number.is_some() && (ignore_config || self.within_range())
    }

    fn increment(&self) -> Option<Self> {
        self.number.as_ref().map(|n| self.with_percent(n.clone() + one()))
    }

    fn decrement(&self) -> Option<Self> {
        self.number.as_ref().map(|n| self.with_percent(n.clone() - one()))
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        self.rounded.cmp(&other.rounded)
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, self.config, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), self.config, Some(input))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let others: Vec<Self> = values.iter().map(|v| self.copy_with(v.raw().clone())).collect();
        let numbers: Vec<Option<BigDecimal>> = others.iter().map(|o| o.rounded.clone()).collect();
        let parsed: Vec<Value> = others.into_iter().map(|o| o.parsed).collect();
        meets_condition_by_number(condition, self.rounded.as_ref(), &numbers, &self.parsed, &parsed)
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        value_by_condition_number(self, condition, values, "0.19")
    }
}
