use super::{format_unknown, is_truthy, raw_text, TypedValue};
use crate::date_format::{
    add_unit, format_date, has_only_time_format, looks_like_iso, parse_date, parse_iso,
    reset_unused_part, reset_week, smallest_unit, start_of_day, start_of_month, DateFrame,
    DateUnit,
};
use crate::text::unescape_html;
use chrono::NaiveDateTime;
use lumio_model::{
    ConditionType, ConditionValue, ConstraintConditionValue, ConstraintData,
    DateTimeConstraintConfig, LanguageTag,
};
use serde_json::Value;
use std::cmp::Ordering;

/// A date with the precision of its display format.
///
/// The parsed date is kept as wall-clock time of its frame (UTC for `asUtc`
/// constraints, the context timezone otherwise) and already has every field
/// the format does not show reset.
#[derive(Debug, Clone)]
pub struct DateTimeDataValue<'a> {
    raw: Value,
    input: Option<String>,
    config: &'a DateTimeConstraintConfig,
    data: &'a ConstraintData,
    frame: DateFrame,
    date: Option<NaiveDateTime>,
}

/// A condition operand resolved to a date plus the format it is compared in.
struct Operand<'f> {
    date: Option<NaiveDateTime>,
    format: Option<&'f str>,
}

impl<'a> DateTimeDataValue<'a> {
    pub fn new(
        raw: Value,
        config: &'a DateTimeConstraintConfig,
        data: &'a ConstraintData,
        input: Option<&str>,
    ) -> Self {
        let frame = if config.as_utc {
            DateFrame::utc()
        } else {
            DateFrame::with_offset(data.timezone_offset)
        };
        let format = config.format.as_deref();
        let language = data.locale();

        let date = match input.filter(|i| !i.is_empty()) {
            Some(text) => {
                let matches_format =
                    format.map_or(false, |f| text.trim().chars().count() == f.chars().count());
                let source = if matches_format || has_only_time_format(format) {
                    text.to_string()
                } else {
                    raw_text(&raw)
                };
                parse_date(&source, format, language, frame)
            }
            None if !is_truthy(&raw) => None,
            None => {
                let text = raw_text(&raw);
                if looks_like_iso(&text) {
                    parse_iso(&text, frame)
                } else {
                    parse_date(&text, format, language, frame)
                }
            }
        };

        Self {
            raw,
            input: input.map(str::to_string),
            config,
            data,
            frame,
            date: date.map(|d| reset_unused_part(d, format)),
        }
    }

    /// Wall-clock date in the value's frame.
    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date
    }

    pub fn frame(&self) -> DateFrame {
        self.frame
    }

    fn format_str(&self) -> Option<&str> {
        self.config.format.as_deref()
    }

    fn language(&self) -> LanguageTag {
        self.data.locale()
    }

    fn copy_date(&self, date: Option<NaiveDateTime>) -> Self {
        match date {
            Some(date) => self.copy_with(Value::String(self.frame.to_iso_string(date))),
            None => self.copy_with(self.raw.clone()),
        }
    }

    fn shift(&self, amount: i32) -> Option<Self> {
        let date = self.date?;
        let unit = self
            .format_str()
            .and_then(smallest_unit)
            .unwrap_or(DateUnit::Day);
        let moved = add_unit(date, unit, amount)?;
        Some(self.copy_date(Some(moved)))
    }

    fn parse_bound(&self, bound: &Option<String>) -> Option<NaiveDateTime> {
        let text = bound.as_deref().filter(|b| !b.is_empty())?;
        parse_date(text, self.format_str(), self.language(), self.frame)
            .map(|d| reset_unused_part(d, self.format_str()))
    }

    fn within_range(&self) -> bool {
        let Some(date) = self.date else {
            return true;
        };
        let above_min = self.parse_bound(&self.config.min_value).map_or(true, |min| date >= min);
        let below_max = self.parse_bound(&self.config.max_value).map_or(true, |max| date <= max);
        above_min && below_max
    }

    fn symbolic_operand(&self, kind: ConstraintConditionValue) -> Operand<'static> {
        let today = start_of_day(self.frame.now());
        let (date, format) = match kind {
            ConstraintConditionValue::Today => (Some(today), "DD M Y"),
            ConstraintConditionValue::Yesterday => (add_unit(today, DateUnit::Day, -1), "DD M Y"),
            ConstraintConditionValue::Tomorrow => (add_unit(today, DateUnit::Day, 1), "DD M Y"),
            ConstraintConditionValue::ThisWeek => (Some(reset_week(today)), "W Y"),
            ConstraintConditionValue::LastWeek => {
                (add_unit(today, DateUnit::Week, -1).map(reset_week), "W Y")
            }
            ConstraintConditionValue::NextWeek => {
                (add_unit(today, DateUnit::Week, 1).map(reset_week), "W Y")
            }
            ConstraintConditionValue::ThisMonth => (Some(start_of_month(today)), "M Y"),
            ConstraintConditionValue::LastMonth => {
                (add_unit(start_of_month(today), DateUnit::Month, -1), "M Y")
            }
            ConstraintConditionValue::NextMonth => {
                (add_unit(start_of_month(today), DateUnit::Month, 1), "M Y")
            }
            ConstraintConditionValue::CurrentUser | ConstraintConditionValue::CurrentTeams => {
                (None, "")
            }
        };
        Operand {
            date,
            format: Some(format),
        }
    }

    /// Operands sorted ascending, unresolvable ones first.
    fn operands(&self, values: &[ConditionValue]) -> Vec<Operand<'_>> {
        let mut operands: Vec<Operand<'_>> = values
            .iter()
            .map(|value| match value.kind {
                Some(kind) => self.symbolic_operand(kind),
                None => Operand {
                    date: self.copy_with(value.raw().clone()).date,
                    format: self.format_str(),
                },
            })
            .map(|op| Operand {
                date: op.date.map(|d| reset_unused_part(d, op.format)),
                format: op.format,
            })
            .collect();
        operands.sort_by(|a, b| a.date.cmp(&b.date));
        operands
    }
}

impl<'a> TypedValue for DateTimeDataValue<'a> {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn format(&self) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        match &self.raw {
            Value::Null => return String::new(),
            Value::String(s) if s.is_empty() => return String::new(),
            _ => {}
        }
        match (self.date, self.format_str()) {
            (Some(date), Some(format)) if !format.is_empty() => {
                format_date(date, format, self.language(), self.frame)
            }
            _ => format_unknown(&self.raw),
        }
    }

    fn edit_value(&self) -> String {
        unescape_html(&self.format())
    }

    fn serialize(&self) -> Value {
        match self.date {
            Some(date) => Value::String(self.frame.to_iso_string(date)),
            None => Value::String(String::new()),
        }
    }

    fn is_valid(&self, ignore_config: bool) -> bool {
        if self.input.is_some() {
            return true;
        }
        if !is_truthy(&self.raw) && !self.raw.is_number() {
            return true;
        }
        self.date.is_some() && (ignore_config || self.within_range())
    }

    fn increment(&self) -> Option<Self> {
        self.shift(1)
    }

    fn decrement(&self) -> Option<Self> {
        self.shift(-1)
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        let own = self.date.map(|d| reset_unused_part(d, self.format_str()));
        let theirs = other.date.map(|d| reset_unused_part(d, other.format_str()));
        own.cmp(&theirs)
    }

    fn copy_with(&self, raw: Value) -> Self {
        Self::new(raw, self.config, self.data, None)
    }

    fn parse_input(&self, input: &str) -> Self {
        Self::new(Value::String(input.to_string()), self.config, self.data, Some(input))
    }

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        let operands = self.operands(values);
        let mut own_dates: Vec<Option<NaiveDateTime>> = operands
            .iter()
            .map(|op| self.date.map(|d| reset_unused_part(d, op.format)))
            .collect();
        own_dates.sort();

        let other = operands.first().and_then(|op| op.date);
        match (self.date, other) {
            (None, None) if condition == ConditionType::Equals => {
                let other_raw = values.first().map_or(&Value::Null, |v| v.raw());
                return (!is_truthy(&self.raw) && !is_truthy(other_raw)) || &self.raw == other_raw;
            }
            (None, Some(_)) | (Some(_), None) if condition == ConditionType::NotEquals => {
                return true;
            }
            _ => {}
        }

        let needed = condition.num_inputs();
        let defined = (0..needed).all(|i| {
            own_dates.get(i).copied().flatten().is_some()
                && operands.get(i).and_then(|op| op.date).is_some()
        });
        if !defined {
            return false;
        }

        let own = |i: usize| own_dates.get(i).copied().flatten();
        let theirs = |i: usize| operands.get(i).and_then(|op| op.date);
        match condition {
            ConditionType::Equals => own(0) == theirs(0),
            ConditionType::NotEquals => own(0) != theirs(0),
            ConditionType::GreaterThan => own(0) > theirs(0),
            ConditionType::GreaterThanEquals => own(0) >= theirs(0),
            ConditionType::LowerThan => own(0) < theirs(0),
            ConditionType::LowerThanEquals => own(0) <= theirs(0),
            ConditionType::Between => own(0) >= theirs(0) && own(1) <= theirs(1),
            ConditionType::NotBetween => own(0) < theirs(0) || own(1) > theirs(1),
            ConditionType::IsEmpty => match &self.raw {
                Value::Null => true,
                Value::String(s) => s.trim().is_empty(),
                _ => false,
            },
            ConditionType::NotEmpty => match &self.raw {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            },
            _ => false,
        }
    }

    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        let dates: Vec<Option<NaiveDateTime>> =
            self.operands(values).into_iter().map(|op| op.date).collect();
        let first = dates.first().copied().flatten();
        let now = || self.copy_date(Some(self.frame.now())).serialize();
        match condition {
            ConditionType::Equals
            | ConditionType::GreaterThanEquals
            | ConditionType::LowerThanEquals => self.copy_date(first).serialize(),
            ConditionType::GreaterThan | ConditionType::Between => {
                let second = dates.get(1).copied().flatten();
                if first.is_some() && first == second {
                    return self.copy_date(first).serialize();
                }
                let base = self.copy_date(first);
                base.increment().unwrap_or(base).serialize()
            }
            ConditionType::LowerThan | ConditionType::NotBetween => {
                let base = self.copy_date(first);
                base.decrement().unwrap_or(base).serialize()
            }
            ConditionType::NotEquals => {
                let given = values
                    .first()
                    .map_or(false, |v| v.kind.is_some() || is_truthy(v.raw()));
                if given {
                    Value::String(String::new())
                } else {
                    now()
                }
            }
            ConditionType::IsEmpty => Value::String(String::new()),
            ConditionType::NotEmpty => now(),
            _ => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(format: &str, as_utc: bool) -> DateTimeConstraintConfig {
        DateTimeConstraintConfig {
            format: Some(format.to_string()),
            as_utc,
            ..Default::default()
        }
    }

    #[test]
    fn formats_iso_values() {
        let config = config("YYYY-MM-DD", true);
        let data = ConstraintData::default();
        let v = DateTimeDataValue::new(json!("2020-03-24T10:00:00.000Z"), &config, &data, None);
        assert_eq!(v.format(), "2020-03-24");
        assert_eq!(v.serialize(), json!("2020-03-24T00:00:00.000Z"));
    }

    #[test]
    fn timezone_offset_shifts_wall_clock() {
        let config = config("DD.MM.YYYY HH:mm", false);
        let data = ConstraintData {
            timezone_offset: Some(120),
            ..Default::default()
        };
        let v = DateTimeDataValue::new(json!("2020-03-24T10:00:00.000Z"), &config, &data, None);
        assert_eq!(v.format(), "24.03.2020 12:00");
        assert_eq!(v.serialize(), json!("2020-03-24T10:00:00.000Z"));
    }

    #[test]
    fn empty_and_invalid_values() {
        let config = config("DD.MM.YYYY", true);
        let data = ConstraintData::default();
        let empty = DateTimeDataValue::new(json!(""), &config, &data, None);
        assert!(empty.is_valid(false));
        assert_eq!(empty.format(), "");
        let invalid = DateTimeDataValue::new(json!("not a date"), &config, &data, None);
        assert!(!invalid.is_valid(false));
        assert_eq!(invalid.format(), "not a date");
    }

    #[test]
    fn range_uses_display_precision() {
        let config = DateTimeConstraintConfig {
            min_value: Some("01.01.2020".to_string()),
            max_value: Some("31.12.2020".to_string()),
            ..config("DD.MM.YYYY", true)
        };
        let data = ConstraintData::default();
        let inside = DateTimeDataValue::new(json!("2020-12-31T23:00:00.000Z"), &config, &data, None);
        let outside = DateTimeDataValue::new(json!("2021-01-01T00:00:00.000Z"), &config, &data, None);
        assert!(inside.is_valid(false));
        assert!(!outside.is_valid(false));
        assert!(outside.is_valid(true));
    }
}
