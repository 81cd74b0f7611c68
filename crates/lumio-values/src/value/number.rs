use super::{
    format_unknown, is_truthy, meets_condition_by_number, value_by_condition_number, TypedValue,
};
use crate::currency::{currency_for, format_number, unformat_number, NumberFormat};
use crate::decimal::{
    decimal_from_json, decimal_store_to_user, decimal_user_to_store, one, parse_decimal,
    plain_string, remove_non_number_characters, round_half_up,
};
use crate::text::{escape_html, unescape_html};
use bigdecimal::BigDecimal;
use lumio_model::{ConditionType, ConditionValue, ConstraintData, LanguageTag, NumberConstraintConfig};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct NumberDataValue<'a> {
    raw: Value,
    input: Option<String>,
    config: &'a NumberConstraintConfig,
    data: &'a ConstraintData,
    number: Option<BigDecimal>,
}

impl<'a> NumberDataValue<'a> {
    pub fn new(
        raw: Value,
        config: &'a NumberConstraintConfig,
        data: &'a ConstraintData,
        input: Option<&str>,
    ) -> Self {
        let number = parse_number(&raw, config, input);
        Self {
            raw,
            input: input.map(str::to_string),
            config,
            data,
            number,
        }
    }

    pub fn number(&self) -> Option<&BigDecimal> {
        self.number.as_ref()
    }

    fn language(&self) -> LanguageTag {
        self.config.currency.or(self.config.locale).unwrap_or_default()
    }

    fn with_number(&self, number: BigDecimal) -> Self {
        Self::new(Value::String(plain_string(&number)), self.config, self.data, None)
    }

    /// Decimal used for ordering: rounded to the configured precision.
    fn comparable(&self) -> Option<BigDecimal> {
        let number = self.number.as_ref()?;
        Some(match self.config.decimals {
            Some(decimals) => round_half_up(number, decimals),
            None => number.clone(),
        })
    }
}

fn parse_number(raw: &Value, config: &NumberConstraintConfig, input: Option<&str>) -> Option<BigDecimal> {
    if let Value::Number(_) = raw {
        return decimal_from_json(raw);
    }
    let raw_text = match raw {
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
        Value::Number(n) => n.to_string(),
    };
    if input.is_none() {
        if let Some(number) = parse_decimal(&raw_text) {
            return Some(number);
        }
    }
    let text = input.filter(|i| !i.is_empty()).map(str::to_string).unwrap_or(raw_text);
    let language = config.currency.or(config.locale).unwrap_or_default();
    if config.separated || config.currency.is_some() {
        return unformat_number(&text, language);
    }
    parse_decimal(&decimal_user_to_store(&text)).or_else(|| unformat_number(&text, language))
}

fn bound(value: &Option<Value>) -> Option<BigDecimal> {
    value.as_ref().and_then(decimal_from_json)
}

impl<'a> TypedValue for NumberDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        if let Some(input) = &self.input {
            return remove_non_number_characters(input);
        }
        match &self.number {
            Some(number) => format_number(
                number,
                &NumberFormat {
                    language: self.language(),
                    decimals: self.config.decimals,
                    separated: self.config.separated,
                    currency: self.config.currency.is_some(),
                    force_sign: self.config.force_sign,
                    negative_parenthesis: self.config.negative,
                    compact: self.config.compact,
                    currency_data: self.data.currency_data.as_ref(),
                },
            ),
            None => format_unknown(&self.raw),
        }
    }

    fn edit_value(&self) -> String {
        if let Some(input) = &self.input {
            return remove_non_number_characters(input);
        }
        match &self.number {
            Some(number) if self.config.currency.is_some() => decimal_store_to_user(
                &plain_string(number),
                currency_for(self.language()).decimal_separator,
            ),
            Some(number) => plain_string(number),
            None => unescape_html(&format_unknown(&self.raw)),
        }
    }

    fn serialize(&self) -> Value {
        match (&self.number, &self.raw) {
            (Some(number), _) => Value::String(plain_string(number)),
            (None, Value::Null) => Value::Null,
            (None, raw) => Value::String(escape_html(&decimal_user_to_store(
                format_unknown(raw).trim(),
            ))),
        }
    }

    fn is_valid(&self, ignore_config: bool) -> bool {
        if let Some(input) = &self.input {
            return input.is_empty() || self.number.is_some();
        }
        if !is_truthy(&self.raw) {
            return true;
        }
        let Some(number) = &self.number else {
            return false;
        };
        if ignore_config {
            return true;
        }
        let above_min = bound(&self.config.min_value).map_or(true, |min| number >= &min);
        let below_max = bound(&self.config.max_value).map_or(true, |max| number <= &max);
        above_min && below_max
    }

    fn increment(&self) -> Option<Self> {
        self.number.as_ref().map(|n| self.with_number(n.clone() + one()))
    }

    fn decrement(&self) -> Option<Self> {
        self.number.as_ref().map(|n| self.with_number(n.clone() - one()))
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        self.comparable().cmp(&other.comparable())
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, self.config, self.data, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), self.config, self.data, Some(input))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let others: Vec<Self> = values.iter().map(|v| self.copy_with(v.raw().clone())).collect();
        let numbers: Vec<Option<BigDecimal>> = others.iter().map(|o| o.number.clone()).collect();
        let raws: Vec<Value> = others.into_iter().map(|o| o.raw).collect();
        meets_condition_by_number(condition, self.number.as_ref(), &numbers, &self.raw, &raws)
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        value_by_condition_number(self, condition, values, "19")
    }
}
