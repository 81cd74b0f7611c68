//! Typed values.
//!
//! A typed value binds one raw stored JSON value to its constraint
//! configuration and the evaluation context. It is built on demand, never
//! mutated, and answers every display, validation, ordering and matching
//! question about that raw value:
//! - **Display**: [`TypedValue::format`], [`TypedValue::title`], [`TypedValue::edit_value`]
//! - **Storage**: [`TypedValue::serialize`] (canonical stored form)
//! - **Validation**: [`TypedValue::is_valid`]
//! - **Ordering**: [`TypedValue::compare_to`]
//! - **Matching**: [`TypedValue::meet_condition`], [`TypedValue::meet_full_texts`]
//! - **Synthesis**: [`TypedValue::value_by_condition`]
//!
//! Each kind implements [`TypedValue`] on its own struct; [`DataValue`] is the
//! closed union the rest of the workspace passes around.

mod action;
mod address;
mod boolean;
mod color;
mod coordinates;
mod datetime;
mod duration;
mod files;
mod link;
mod number;
mod percentage;
mod select;
mod team;
mod text;
mod unknown;
mod user;
mod view;

pub use action::ActionDataValue;
pub use address::{format_address, AddressDataValue};
pub use boolean::{is_checked, BooleanDataValue};
pub use color::{parse_color, ColorDataValue};
pub use coordinates::{format_coordinates, parse_coordinates, CoordinatesDataValue, MapCoordinates};
pub use datetime::DateTimeDataValue;
pub use duration::DurationDataValue;
pub use files::FilesDataValue;
pub use link::{complete_link_value, format_link_value, parse_link_value, LinkDataValue};
pub use number::NumberDataValue;
pub use percentage::PercentageDataValue;
pub use select::SelectDataValue;
pub use team::TeamDataValue;
pub use text::TextDataValue;
pub use unknown::UnknownDataValue;
pub use user::{is_team_value, team_value, UserDataValue};
pub use view::ViewDataValue;

use crate::decimal::{decimal_from_json, plain_string};
use crate::text::{fold_fulltext, unescape_html};
use bigdecimal::BigDecimal;
use lumio_model::{
    ConditionType, ConditionValue, ConstraintConditionValue, ConstraintData, ConstraintType,
};
use serde_json::Value;
use std::cmp::Ordering;

// ============================================================================
// Trait
// ============================================================================

/// Behaviour shared by every value kind.
pub trait TypedValue: Clone {
    /// The raw stored value this typed value was built from.
    fn raw(&self) -> &Value;

    /// Display text; a live-edit input always wins over the stored value.
    fn format(&self) -> String;

    /// Plain-text variant of [`TypedValue::format`].
    fn title(&self) -> String {
        unescape_html(&self.format())
    }

    /// Text placed into an editor.
    fn edit_value(&self) -> String {
        self.title()
    }

    /// Canonical storage form.
    fn serialize(&self) -> Value;

    /// Empty values are always valid; `ignore_config` skips range checks.
    fn is_valid(&self, ignore_config: bool) -> bool;

    fn increment(&self) -> Option<Self> {
        None
    }

    fn decrement(&self) -> Option<Self> {
        None
    }

    fn compare_to(&self, other: &Self) -> Ordering;

    /// Same configuration and context, another raw value.
    fn copy_with(&self, raw: Value) -> Self;

    /// Value being typed: `input` is both the raw value and the live input.
    fn parse_input(&self, input: &str) -> Self;

    fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool;

    fn meet_full_texts(&self, fulltexts: &[String]) -> bool {
        meets_fulltexts(&self.format(), fulltexts)
    }

    /// An example raw value satisfying `condition`.
    fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value;
}

// ============================================================================
// Closed union
// ============================================================================

#[derive(Debug, Clone)]
pub enum DataValue<'a> {
    Action(ActionDataValue<'a>),
    Address(AddressDataValue<'a>),
    Boolean(BooleanDataValue),
    Color(ColorDataValue),
    Coordinates(CoordinatesDataValue<'a>),
    DateTime(DateTimeDataValue<'a>),
    Duration(DurationDataValue<'a>),
    Files(FilesDataValue),
    Link(LinkDataValue),
    Number(NumberDataValue<'a>),
    Percentage(PercentageDataValue<'a>),
    Select(SelectDataValue<'a>),
    Text(TextDataValue<'a>),
    Team(TeamDataValue<'a>),
    User(UserDataValue<'a>),
    View(ViewDataValue<'a>),
    Unknown(UnknownDataValue),
}

macro_rules! dispatch {
    ($value:expr, $v:ident => $body:expr) => {
        match $value {
            DataValue::Action($v) => $body,
            DataValue::Address($v) => $body,
            DataValue::Boolean($v) => $body,
            DataValue::Color($v) => $body,
            DataValue::Coordinates($v) => $body,
            DataValue::DateTime($v) => $body,
            DataValue::Duration($v) => $body,
            DataValue::Files($v) => $body,
            DataValue::Link($v) => $body,
            DataValue::Number($v) => $body,
            DataValue::Percentage($v) => $body,
            DataValue::Select($v) => $body,
            DataValue::Text($v) => $body,
            DataValue::Team($v) => $body,
            DataValue::User($v) => $body,
            DataValue::View($v) => $body,
            DataValue::Unknown($v) => $body,
        }
    };
}

macro_rules! rewrap {
    ($value:expr, $v:ident => $body:expr) => {
        match $value {
            DataValue::Action($v) => DataValue::Action($body),
            DataValue::Address($v) => DataValue::Address($body),
            DataValue::Boolean($v) => DataValue::Boolean($body),
            DataValue::Color($v) => DataValue::Color($body),
            DataValue::Coordinates($v) => DataValue::Coordinates($body),
            DataValue::DateTime($v) => DataValue::DateTime($body),
            DataValue::Duration($v) => DataValue::Duration($body),
            DataValue::Files($v) => DataValue::Files($body),
            DataValue::Link($v) => DataValue::Link($body),
            DataValue::Number($v) => DataValue::Number($body),
            DataValue::Percentage($v) => DataValue::Percentage($body),
            DataValue::Select($v) => DataValue::Select($body),
            DataValue::Text($v) => DataValue::Text($body),
            DataValue::Team($v) => DataValue::Team($body),
            DataValue::User($v) => DataValue::User($body),
            DataValue::View($v) => DataValue::View($body),
            DataValue::Unknown($v) => DataValue::Unknown($body),
        }
    };
}

macro_rules! rewrap_opt {
    ($value:expr, $v:ident => $body:expr) => {
        match $value {
            DataValue::Action($v) => $body.map(DataValue::Action),
            DataValue::Address($v) => $body.map(DataValue::Address),
            DataValue::Boolean($v) => $body.map(DataValue::Boolean),
            DataValue::Color($v) => $body.map(DataValue::Color),
            DataValue::Coordinates($v) => $body.map(DataValue::Coordinates),
            DataValue::DateTime($v) => $body.map(DataValue::DateTime),
            DataValue::Duration($v) => $body.map(DataValue::Duration),
            DataValue::Files($v) => $body.map(DataValue::Files),
            DataValue::Link($v) => $body.map(DataValue::Link),
            DataValue::Number($v) => $body.map(DataValue::Number),
            DataValue::Percentage($v) => $body.map(DataValue::Percentage),
            DataValue::Select($v) => $body.map(DataValue::Select),
            DataValue::Text($v) => $body.map(DataValue::Text),
            DataValue::Team($v) => $body.map(DataValue::Team),
            DataValue::User($v) => $body.map(DataValue::User),
            DataValue::View($v) => $body.map(DataValue::View),
            DataValue::Unknown($v) => $body.map(DataValue::Unknown),
        }
    };
}

impl<'a> DataValue<'a> {
    pub fn kind(&self) -> ConstraintType {
        match self {
            DataValue::Action(_) => ConstraintType::Action,
            DataValue::Address(_) => ConstraintType::Address,
            DataValue::Boolean(_) => ConstraintType::Boolean,
            DataValue::Color(_) => ConstraintType::Color,
            DataValue::Coordinates(_) => ConstraintType::Coordinates,
            DataValue::DateTime(_) => ConstraintType::DateTime,
            DataValue::Duration(_) => ConstraintType::Duration,
            DataValue::Files(_) => ConstraintType::Files,
            DataValue::Link(_) => ConstraintType::Link,
            DataValue::Number(_) => ConstraintType::Number,
            DataValue::Percentage(_) => ConstraintType::Percentage,
            DataValue::Select(_) => ConstraintType::Select,
            DataValue::Text(_) => ConstraintType::Text,
            DataValue::Team(_) => ConstraintType::Team,
            DataValue::User(_) => ConstraintType::User,
            DataValue::View(_) => ConstraintType::View,
            DataValue::Unknown(_) => ConstraintType::Unknown,
        }
    }

    pub fn raw(&self) -> &Value {
        dispatch!(self, v => v.raw())
    }

    pub fn format(&self) -> String {
        dispatch!(self, v => v.format())
    }

    pub fn title(&self) -> String {
        dispatch!(self, v => v.title())
    }

    pub fn edit_value(&self) -> String {
        dispatch!(self, v => v.edit_value())
    }

    pub fn serialize(&self) -> Value {
        dispatch!(self, v => v.serialize())
    }

    pub fn is_valid(&self, ignore_config: bool) -> bool {
        dispatch!(self, v => v.is_valid(ignore_config))
    }

    pub fn increment(&self) -> Option<DataValue<'a>> {
        rewrap_opt!(self, v => v.increment())
    }

    pub fn decrement(&self) -> Option<DataValue<'a>> {
        rewrap_opt!(self, v => v.decrement())
    }

    /// Values of different kinds compare by their formatted text.
    pub fn compare_to(&self, other: &DataValue<'a>) -> Ordering {
        match (self, other) {
            (DataValue::Action(a), DataValue::Action(b)) => a.compare_to(b),
            (DataValue::Address(a), DataValue::Address(b)) => a.compare_to(b),
            (DataValue::Boolean(a), DataValue::Boolean(b)) => a.compare_to(b),
            (DataValue::Color(a), DataValue::Color(b)) => a.compare_to(b),
            (DataValue::Coordinates(a), DataValue::Coordinates(b)) => a.compare_to(b),
            (DataValue::DateTime(a), DataValue::DateTime(b)) => a.compare_to(b),
            (DataValue::Duration(a), DataValue::Duration(b)) => a.compare_to(b),
            (DataValue::Files(a), DataValue::Files(b)) => a.compare_to(b),
            (DataValue::Link(a), DataValue::Link(b)) => a.compare_to(b),
            (DataValue::Number(a), DataValue::Number(b)) => a.compare_to(b),
            (DataValue::Percentage(a), DataValue::Percentage(b)) => a.compare_to(b),
            (DataValue::Select(a), DataValue::Select(b)) => a.compare_to(b),
            (DataValue::Text(a), DataValue::Text(b)) => a.compare_to(b),
            (DataValue::Team(a), DataValue::Team(b)) => a.compare_to(b),
            (DataValue::User(a), DataValue::User(b)) => a.compare_to(b),
            (DataValue::View(a), DataValue::View(b)) => a.compare_to(b),
            (DataValue::Unknown(a), DataValue::Unknown(b)) => a.compare_to(b),
            _ => self.format().cmp(&other.format()),
        }
    }

    /// A fresh value from the same raw input.
    pub fn copy(&self) -> DataValue<'a> {
        self.copy_with(self.raw().clone())
    }

    pub fn copy_with(&self, raw: Value) -> DataValue<'a> {
        rewrap!(self, v => v.copy_with(raw))
    }

    pub fn parse_input(&self, input: &str) -> DataValue<'a> {
        rewrap!(self, v => v.parse_input(input))
    }

    /// Fails closed when fewer condition values are given than the condition
    /// reads.
    pub fn meet_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> bool {
        if values.len() < condition.num_inputs() {
            return false;
        }
        dispatch!(self, v => v.meet_condition(condition, values))
    }

    pub fn meet_full_texts(&self, fulltexts: &[String]) -> bool {
        dispatch!(self, v => v.meet_full_texts(fulltexts))
    }

    pub fn value_by_condition(&self, condition: ConditionType, values: &[ConditionValue]) -> Value {
        dispatch!(self, v => v.value_by_condition(condition, values))
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Best-effort display of a raw value no kind could interpret.
pub fn format_unknown(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(_) => decimal_from_json(value)
            .map(|d| plain_string(&d))
            .unwrap_or_else(|| value.to_string()),
        Value::Array(items) => items
            .iter()
            .map(format_unknown)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Loose truthiness of stored values: `null`, `""`, `0` and `false` are empty.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strings as they are, numbers and booleans as text, anything else empty.
pub(crate) fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(_) | Value::Bool(_) => format_unknown(value),
        _ => String::new(),
    }
}

/// Every term must occur in the folded text; no terms always match.
pub(crate) fn meets_fulltexts(text: &str, fulltexts: &[String]) -> bool {
    let folded = fold_fulltext(text);
    fulltexts
        .iter()
        .map(|f| fold_fulltext(f))
        .all(|term| folded.contains(&term))
}

/// Raw literal of the `index`-th condition value, `Null` when missing.
pub(crate) fn condition_raw(values: &[ConditionValue], index: usize) -> &Value {
    values.get(index).map_or(&Value::Null, |v| v.raw())
}

/// Numeric condition semantics shared by number, percentage and duration.
pub(crate) fn meets_condition_by_number(
    condition: ConditionType,
    number: Option<&BigDecimal>,
    others: &[Option<BigDecimal>],
    raw: &Value,
    other_raws: &[Value],
) -> bool {
    let other = |i: usize| others.get(i).and_then(|o| o.as_ref());
    let equals = || match (number, other(0)) {
        (Some(a), Some(b)) => a == b,
        (None, None) => {
            let own = raw_text(raw);
            let theirs = other_raws.first().map(raw_text).unwrap_or_default();
            (own.trim().is_empty() && theirs.trim().is_empty()) || own == theirs
        }
        _ => false,
    };
    match condition {
        ConditionType::Equals => equals(),
        ConditionType::NotEquals => !equals(),
        ConditionType::GreaterThan => matches!((number, other(0)), (Some(a), Some(b)) if a > b),
        ConditionType::GreaterThanEquals => matches!((number, other(0)), (Some(a), Some(b)) if a >= b),
        ConditionType::LowerThan => matches!((number, other(0)), (Some(a), Some(b)) if a < b),
        ConditionType::LowerThanEquals => matches!((number, other(0)), (Some(a), Some(b)) if a <= b),
        ConditionType::Between => {
            matches!((number, other(0), other(1)), (Some(v), Some(lo), Some(hi)) if v >= lo && v <= hi)
        }
        ConditionType::NotBetween => {
            matches!((number, other(0), other(1)), (Some(v), Some(lo), Some(hi)) if v < lo || v > hi)
        }
        ConditionType::IsEmpty => raw_text(raw).trim().is_empty() && number.is_none(),
        ConditionType::NotEmpty => !raw_text(raw).trim().is_empty() || number.is_some(),
        _ => false,
    }
}

/// Example value for a numeric condition, built from the operands' own kind so
/// that increments respect its unit.
pub(crate) fn value_by_condition_number<T: TypedValue>(
    value: &T,
    condition: ConditionType,
    values: &[ConditionValue],
    fallback: &str,
) -> Value {
    let operand = |i: usize| value.copy_with(condition_raw(values, i).clone());
    let fallback_value = || Value::String(fallback.to_string());
    let shifted = |up: bool| {
        let base = operand(0);
        let moved = if up { base.increment() } else { base.decrement() };
        moved.map_or_else(fallback_value, |v| v.serialize())
    };
    match condition {
        ConditionType::Equals
        | ConditionType::GreaterThanEquals
        | ConditionType::LowerThanEquals
        | ConditionType::Between => operand(0).serialize(),
        ConditionType::GreaterThan | ConditionType::NotEquals => shifted(true),
        ConditionType::LowerThan | ConditionType::NotBetween => shifted(false),
        ConditionType::IsEmpty => Value::String(String::new()),
        ConditionType::NotEmpty => fallback_value(),
        _ => Value::Null,
    }
}

/// Text condition semantics on already normalized (lowercased, trimmed)
/// strings.
pub(crate) fn meets_condition_by_text(condition: ConditionType, text: &str, others: &[String]) -> bool {
    let other = others.first().map(String::as_str).unwrap_or("");
    match condition {
        ConditionType::Equals => text == other,
        ConditionType::NotEquals => text != other,
        ConditionType::Contains => text.contains(other),
        ConditionType::NotContains => !text.contains(other),
        ConditionType::StartsWith => text.starts_with(other),
        ConditionType::EndsWith => text.ends_with(other),
        ConditionType::IsEmpty => text.is_empty(),
        ConditionType::NotEmpty => !text.is_empty(),
        _ => false,
    }
}

pub(crate) fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

pub(crate) fn value_by_condition_text(
    condition: ConditionType,
    values: &[ConditionValue],
    fallback: &str,
) -> Value {
    let first = raw_text(condition_raw(values, 0));
    match condition {
        ConditionType::Equals
        | ConditionType::Contains
        | ConditionType::StartsWith
        | ConditionType::EndsWith => Value::String(first),
        ConditionType::NotEquals | ConditionType::NotContains if !first.trim().is_empty() => {
            Value::String(String::new())
        }
        ConditionType::NotEquals | ConditionType::NotContains | ConditionType::NotEmpty => {
            Value::String(fallback.to_string())
        }
        ConditionType::IsEmpty => Value::String(String::new()),
        _ => Value::Null,
    }
}

/// True when a condition names the current user or their teams but nobody is
/// signed in. Such conditions match nothing, negated ones included.
pub(crate) fn lacks_current_user(values: &[ConditionValue], data: &ConstraintData) -> bool {
    data.current_user.is_none()
        && values.iter().any(|v| {
            matches!(
                v.kind,
                Some(ConstraintConditionValue::CurrentUser | ConstraintConditionValue::CurrentTeams)
            )
        })
}

/// Set condition semantics over identifiers, shared by team and view.
pub(crate) fn meets_condition_by_ids(
    condition: ConditionType,
    own: &[String],
    others: &[String],
    formatted: &str,
) -> bool {
    let in_others = |id: &String| others.contains(id);
    match condition {
        ConditionType::HasSome | ConditionType::Equals => own.iter().any(in_others),
        ConditionType::HasNoneOf | ConditionType::NotEquals => !own.iter().any(in_others),
        ConditionType::In => !own.is_empty() && own.iter().all(in_others),
        ConditionType::HasAll => others.iter().all(|id| own.contains(id)),
        ConditionType::IsEmpty => own.is_empty() && formatted.trim().is_empty(),
        ConditionType::NotEmpty => !own.is_empty() || !formatted.trim().is_empty(),
        _ => false,
    }
}

/// Example identifiers for a set condition; `known` lists every identifier the
/// context offers.
pub(crate) fn value_by_condition_ids(
    condition: ConditionType,
    values: &[ConditionValue],
    others: &[String],
    known: &[String],
) -> Value {
    let string = |id: Option<&String>| id.map_or(Value::Null, |id| Value::String(id.clone()));
    match condition {
        ConditionType::HasSome | ConditionType::Equals | ConditionType::In => string(others.first()),
        ConditionType::HasAll => condition_raw(values, 0).clone(),
        ConditionType::HasNoneOf | ConditionType::NotEquals => {
            string(known.iter().find(|id| !others.contains(id)))
        }
        ConditionType::IsEmpty => Value::String(String::new()),
        ConditionType::NotEmpty => string(known.first()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_formatting() {
        assert_eq!(format_unknown(&json!(null)), "");
        assert_eq!(format_unknown(&json!(10.50)), "10.5");
        assert_eq!(format_unknown(&json!(["a", null, 2])), "a, 2");
        assert_eq!(format_unknown(&json!(true)), "true");
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!([])));
    }

    #[test]
    fn fulltext_terms_fold_accents() {
        let terms = vec!["kosice".to_string(), "ZIL".to_string()];
        assert!(meets_fulltexts("Košice a Žilina", &terms));
        assert!(!meets_fulltexts("Košice", &terms));
        assert!(meets_fulltexts("anything", &[]));
    }

    #[test]
    fn text_conditions() {
        let others = vec!["ab".to_string()];
        assert!(meets_condition_by_text(ConditionType::StartsWith, "abc", &others));
        assert!(!meets_condition_by_text(ConditionType::EndsWith, "abc", &others));
        assert!(meets_condition_by_text(ConditionType::NotContains, "xyz", &others));
    }
}
