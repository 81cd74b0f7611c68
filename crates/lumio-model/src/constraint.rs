//! Constraint descriptors and their typed configuration records.
//!
//! An attribute stores a constraint as a type tag plus an untyped JSON
//! configuration blob. [`ConstraintSpec::config_as`] decodes the blob into one of
//! the configuration structs below; a malformed blob decodes to the default
//! configuration rather than failing.

use crate::de::{null_default, opt_stringish, stringish};
use crate::language::LanguageTag;
use crate::permissions::RoleType;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintType {
    Action,
    Address,
    Boolean,
    Color,
    Coordinates,
    DateTime,
    Duration,
    Files,
    Link,
    Number,
    Percentage,
    Select,
    Text,
    Team,
    User,
    View,
    #[serde(other)]
    Unknown,
}

impl ConstraintType {
    pub const ALL: [ConstraintType; 17] = [
        ConstraintType::Action,
        ConstraintType::Address,
        ConstraintType::Boolean,
        ConstraintType::Color,
        ConstraintType::Coordinates,
        ConstraintType::DateTime,
        ConstraintType::Duration,
        ConstraintType::Files,
        ConstraintType::Link,
        ConstraintType::Number,
        ConstraintType::Percentage,
        ConstraintType::Select,
        ConstraintType::Text,
        ConstraintType::Team,
        ConstraintType::User,
        ConstraintType::View,
        ConstraintType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintType::Action => "Action",
            ConstraintType::Address => "Address",
            ConstraintType::Boolean => "Boolean",
            ConstraintType::Color => "Color",
            ConstraintType::Coordinates => "Coordinates",
            ConstraintType::DateTime => "DateTime",
            ConstraintType::Duration => "Duration",
            ConstraintType::Files => "Files",
            ConstraintType::Link => "Link",
            ConstraintType::Number => "Number",
            ConstraintType::Percentage => "Percentage",
            ConstraintType::Select => "Select",
            ConstraintType::Text => "Text",
            ConstraintType::Team => "Team",
            ConstraintType::User => "User",
            ConstraintType::View => "View",
            ConstraintType::Unknown => "Unknown",
        }
    }

    /// Unrecognised tags map to [`ConstraintType::Unknown`].
    pub fn from_tag(tag: &str) -> ConstraintType {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == tag)
            .unwrap_or(ConstraintType::Unknown)
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored form of a constraint: type tag plus configuration blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    #[serde(rename = "type")]
    pub kind: ConstraintType,
    #[serde(default)]
    pub config: Value,
}

impl ConstraintSpec {
    pub fn new(kind: ConstraintType, config: Value) -> Self {
        Self { kind, config }
    }

    pub fn config_as<T: DeserializeOwned + Default>(&self) -> T {
        decode_config(&self.config)
    }
}

/// Decodes a configuration blob, falling back to the default record.
pub fn decode_config<T: DeserializeOwned + Default>(config: &Value) -> T {
    if config.is_null() {
        return T::default();
    }
    serde_json::from_value(config.clone()).unwrap_or_default()
}

// ============================================================================
// Number / Percentage
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberConstraintConfig {
    pub min_value: Option<Value>,
    pub max_value: Option<Value>,
    pub decimals: Option<u32>,
    pub compact: bool,
    pub separated: bool,
    pub force_sign: bool,
    pub negative: bool,
    pub currency: Option<LanguageTag>,
    /// Locale the constraint was created for; separators fall back to it.
    pub locale: Option<LanguageTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PercentageDisplayStyle {
    Text,
    ProgressBar,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PercentageConstraintConfig {
    pub format: Option<String>,
    pub decimals: Option<u32>,
    pub min_value: Option<Value>,
    pub max_value: Option<Value>,
    pub style: Option<PercentageDisplayStyle>,
    pub color: Option<String>,
}

// ============================================================================
// Duration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DurationUnit {
    #[serde(rename = "w")]
    Weeks,
    #[serde(rename = "d")]
    Days,
    #[serde(rename = "h")]
    Hours,
    #[serde(rename = "m")]
    Minutes,
    #[serde(rename = "s")]
    Seconds,
}

impl DurationUnit {
    /// Largest to smallest.
    pub const ALL: [DurationUnit; 5] = [
        DurationUnit::Weeks,
        DurationUnit::Days,
        DurationUnit::Hours,
        DurationUnit::Minutes,
        DurationUnit::Seconds,
    ];

    pub fn letter(&self) -> char {
        match self {
            DurationUnit::Weeks => 'w',
            DurationUnit::Days => 'd',
            DurationUnit::Hours => 'h',
            DurationUnit::Minutes => 'm',
            DurationUnit::Seconds => 's',
        }
    }

    pub fn from_letter(letter: char) -> Option<DurationUnit> {
        Self::ALL.iter().copied().find(|u| u.letter() == letter)
    }

    /// The next smaller unit; seconds convert to milliseconds.
    pub fn smaller(&self) -> Option<DurationUnit> {
        match self {
            DurationUnit::Weeks => Some(DurationUnit::Days),
            DurationUnit::Days => Some(DurationUnit::Hours),
            DurationUnit::Hours => Some(DurationUnit::Minutes),
            DurationUnit::Minutes => Some(DurationUnit::Seconds),
            DurationUnit::Seconds => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DurationType {
    #[default]
    Work,
    Classic,
    Custom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DurationConstraintConfig {
    #[serde(rename = "type")]
    pub kind: Option<DurationType>,
    /// Unit letter → how many of the next smaller unit it holds.
    pub conversions: Option<std::collections::BTreeMap<String, f64>>,
    pub max_unit: Option<DurationUnit>,
    pub max_units: Option<u32>,
    pub decimal_places: Option<u32>,
}

// ============================================================================
// DateTime
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateTimeConstraintConfig {
    pub format: Option<String>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub range: bool,
    pub as_utc: bool,
}

// ============================================================================
// Select / User / Team / View
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    #[serde(deserialize_with = "stringish")]
    pub value: String,
    #[serde(default, deserialize_with = "opt_stringish", skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, display_value: Option<&str>) -> Self {
        Self {
            value: value.into(),
            display_value: display_value.map(str::to_string),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectConstraintConfig {
    pub multi: bool,
    pub selection_list_id: Option<String>,
    pub display_values: bool,
    #[serde(deserialize_with = "null_default")]
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserConstraintType {
    Users,
    Teams,
    UsersAndTeams,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserConstraintConfig {
    pub multi: bool,
    pub only_icon: bool,
    pub external_users: bool,
    #[serde(rename = "type")]
    pub kind: Option<UserConstraintType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamConstraintConfig {
    pub multi: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConstraintConfig {
    pub multi: bool,
    pub open_in_new_window: bool,
}

// ============================================================================
// Text-like kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaseStyle {
    #[default]
    None,
    LowerCase,
    UpperCase,
    TitleCase,
    SentenceCase,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextConstraintConfig {
    pub case_style: Option<CaseStyle>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub regexp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkConstraintConfig {
    pub open_in_app: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorConstraintConfig {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanConstraintConfig {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesConstraintConfig {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoordinatesFormat {
    #[default]
    #[serde(rename = "DD")]
    DecimalDegrees,
    #[serde(rename = "DMS")]
    DegreesMinutesSeconds,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoordinatesConstraintConfig {
    pub format: Option<CoordinatesFormat>,
    pub precision: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressField {
    Street,
    HouseNumber,
    PostalCode,
    City,
    County,
    State,
    Country,
    Continent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressConstraintConfig {
    #[serde(deserialize_with = "null_default")]
    pub fields: Vec<AddressField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionConstraintConfig {
    pub requires_confirmation: bool,
    pub confirmation_title: Option<String>,
    pub rule: Option<String>,
    pub background: Option<String>,
    pub title: Option<String>,
    pub icon: Option<String>,
    /// Role the caller must hold on the record for the action to be enabled.
    pub role: Option<RoleType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_type_tags_decode_to_unknown() {
        let spec: ConstraintSpec = serde_json::from_value(json!({"type": "Rating"})).unwrap();
        assert_eq!(spec.kind, ConstraintType::Unknown);
        assert_eq!(ConstraintType::from_tag("DateTime"), ConstraintType::DateTime);
    }

    #[test]
    fn malformed_config_falls_back_to_default() {
        let spec = ConstraintSpec::new(ConstraintType::Number, json!({"decimals": "many"}));
        let config: NumberConstraintConfig = spec.config_as();
        assert_eq!(config, NumberConstraintConfig::default());
    }

    #[test]
    fn select_options_accept_numbers() {
        let config: SelectConstraintConfig = decode_config(&json!({
            "multi": true,
            "options": [{"value": 1, "displayValue": "One"}, {"value": "b"}]
        }));
        assert!(config.multi);
        assert_eq!(config.options[0].value, "1");
        assert_eq!(config.options[0].display_value.as_deref(), Some("One"));
        assert_eq!(config.options[1].value, "b");
    }

    #[test]
    fn duration_config_decodes_units() {
        let config: DurationConstraintConfig = decode_config(&json!({
            "type": "Custom",
            "conversions": {"w": 5, "d": 8, "h": 60, "m": 60, "s": 1000},
            "maxUnit": "d"
        }));
        assert_eq!(config.kind, Some(DurationType::Custom));
        assert_eq!(config.max_unit, Some(DurationUnit::Days));
        assert_eq!(config.conversions.unwrap()["d"], 8.0);
    }
}
