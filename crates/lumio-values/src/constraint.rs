//! Value-type registry.
//!
//! A [`Constraint`] owns one decoded configuration record and is the factory for
//! typed values of its kind. It also answers which conditions and aggregations
//! the kind supports.

use crate::aggregation::DataAggregationType;
use crate::value::*;
use lumio_model::{
    ActionConstraintConfig, AddressConstraintConfig, ConditionType, ConstraintData,
    ConstraintSpec, ConstraintType, CoordinatesConstraintConfig, DataMap, DateTimeConstraintConfig,
    DurationConstraintConfig, LanguageTag, LinkConstraintConfig, NumberConstraintConfig,
    PercentageConstraintConfig, SelectConstraintConfig, TeamConstraintConfig, TextConstraintConfig,
    UserConstraintConfig, ViewConstraintConfig,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Action(ActionConstraintConfig),
    Address(AddressConstraintConfig),
    Boolean,
    Color,
    Coordinates(CoordinatesConstraintConfig),
    DateTime(DateTimeConstraintConfig),
    Duration(DurationConstraintConfig),
    Files,
    Link(LinkConstraintConfig),
    Number(NumberConstraintConfig),
    Percentage(PercentageConstraintConfig),
    Select(SelectConstraintConfig),
    Text(TextConstraintConfig),
    Team(TeamConstraintConfig),
    User(UserConstraintConfig),
    View(ViewConstraintConfig),
    Unknown,
}

// ============================================================================
// Factory
// ============================================================================

/// Builds a constraint from its stored type tag and configuration blob. A
/// number without an explicit locale takes `locale`.
pub fn create_constraint(kind: ConstraintType, config: &Value, locale: LanguageTag) -> Constraint {
    match kind {
        ConstraintType::Action => Constraint::Action(decode(kind, config)),
        ConstraintType::Address => Constraint::Address(decode(kind, config)),
        ConstraintType::Boolean => Constraint::Boolean,
        ConstraintType::Color => Constraint::Color,
        ConstraintType::Coordinates => Constraint::Coordinates(decode(kind, config)),
        ConstraintType::DateTime => Constraint::DateTime(decode(kind, config)),
        ConstraintType::Duration => Constraint::Duration(decode(kind, config)),
        ConstraintType::Files => Constraint::Files,
        ConstraintType::Link => Constraint::Link(decode(kind, config)),
        ConstraintType::Number => {
            let mut number: NumberConstraintConfig = decode(kind, config);
            number.locale.get_or_insert(locale);
            Constraint::Number(number)
        }
        ConstraintType::Percentage => Constraint::Percentage(decode(kind, config)),
        ConstraintType::Select => Constraint::Select(decode(kind, config)),
        ConstraintType::Text => Constraint::Text(decode(kind, config)),
        ConstraintType::Team => Constraint::Team(decode(kind, config)),
        ConstraintType::User => Constraint::User(decode(kind, config)),
        ConstraintType::View => Constraint::View(decode(kind, config)),
        ConstraintType::Unknown => Constraint::Unknown,
    }
}

/// Malformed configuration degrades to the kind's defaults.
fn decode<T: DeserializeOwned + Default>(kind: ConstraintType, config: &Value) -> T {
    if config.is_null() {
        return T::default();
    }
    serde_json::from_value(config.clone()).unwrap_or_else(|err| {
        debug!(?kind, error = %err, "constraint config does not decode, using defaults");
        T::default()
    })
}

impl Constraint {
    /// Constraint of an attribute; attributes without one are `Unknown`.
    pub fn from_spec(spec: Option<&ConstraintSpec>, locale: LanguageTag) -> Constraint {
        match spec {
            Some(spec) => create_constraint(spec.kind, &spec.config, locale),
            None => Constraint::Unknown,
        }
    }

    pub fn kind(&self) -> ConstraintType {
        match self {
            Constraint::Action(_) => ConstraintType::Action,
            Constraint::Address(_) => ConstraintType::Address,
            Constraint::Boolean => ConstraintType::Boolean,
            Constraint::Color => ConstraintType::Color,
            Constraint::Coordinates(_) => ConstraintType::Coordinates,
            Constraint::DateTime(_) => ConstraintType::DateTime,
            Constraint::Duration(_) => ConstraintType::Duration,
            Constraint::Files => ConstraintType::Files,
            Constraint::Link(_) => ConstraintType::Link,
            Constraint::Number(_) => ConstraintType::Number,
            Constraint::Percentage(_) => ConstraintType::Percentage,
            Constraint::Select(_) => ConstraintType::Select,
            Constraint::Text(_) => ConstraintType::Text,
            Constraint::Team(_) => ConstraintType::Team,
            Constraint::User(_) => ConstraintType::User,
            Constraint::View(_) => ConstraintType::View,
            Constraint::Unknown => ConstraintType::Unknown,
        }
    }

    // ========================================================================
    // Typed values
    // ========================================================================

    pub fn create_data_value<'a>(&'a self, raw: Value, data: &'a ConstraintData) -> DataValue<'a> {
        self.build(raw, data, None)
    }

    /// A value being typed by the user.
    pub fn create_input_data_value<'a>(&'a self, input: &str, data: &'a ConstraintData) -> DataValue<'a> {
        self.build(Value::String(input.to_string()), data, Some(input))
    }

    fn build<'a>(&'a self, raw: Value, data: &'a ConstraintData, input: Option<&str>) -> DataValue<'a> {
        match self {
            Constraint::Action(config) => DataValue::Action(ActionDataValue::new(raw, config)),
            Constraint::Address(config) => {
                DataValue::Address(AddressDataValue::new(raw, config, data, input))
            }
            Constraint::Boolean => DataValue::Boolean(BooleanDataValue::new(raw)),
            Constraint::Color => DataValue::Color(ColorDataValue::new(raw, input)),
            Constraint::Coordinates(config) => {
                DataValue::Coordinates(CoordinatesDataValue::new(raw, config, input))
            }
            Constraint::DateTime(config) => {
                DataValue::DateTime(DateTimeDataValue::new(raw, config, data, input))
            }
            Constraint::Duration(config) => {
                DataValue::Duration(DurationDataValue::new(raw, config, data, input))
            }
            Constraint::Files => DataValue::Files(FilesDataValue::new(raw)),
            Constraint::Link(_) => DataValue::Link(LinkDataValue::new(raw, input)),
            Constraint::Number(config) => {
                DataValue::Number(NumberDataValue::new(raw, config, data, input))
            }
            Constraint::Percentage(config) => {
                DataValue::Percentage(PercentageDataValue::new(raw, config, input))
            }
            Constraint::Select(config) => {
                DataValue::Select(SelectDataValue::new(raw, config, data, input))
            }
            Constraint::Text(config) => DataValue::Text(TextDataValue::new(raw, config, input)),
            Constraint::Team(config) => DataValue::Team(TeamDataValue::new(raw, config, data, input)),
            Constraint::User(config) => DataValue::User(UserDataValue::new(raw, config, data, input)),
            Constraint::View(config) => DataValue::View(ViewDataValue::new(raw, config, data, input)),
            Constraint::Unknown => DataValue::Unknown(UnknownDataValue::new(raw, input)),
        }
    }

    // ========================================================================
    // Capabilities
    // ========================================================================

    /// Conditions a filter on this kind may use.
    pub fn conditions(&self) -> &'static [ConditionType] {
        use ConditionType::*;
        match self.kind() {
            ConstraintType::Action => &[Enabled, Disabled],
            ConstraintType::Boolean => &[Equals, NotEquals],
            ConstraintType::Number
            | ConstraintType::Percentage
            | ConstraintType::Duration
            | ConstraintType::DateTime => &[
                Equals,
                NotEquals,
                GreaterThan,
                LowerThan,
                GreaterThanEquals,
                LowerThanEquals,
                Between,
                NotBetween,
                IsEmpty,
                NotEmpty,
            ],
            ConstraintType::Select
            | ConstraintType::User
            | ConstraintType::Team
            | ConstraintType::View => &[HasSome, HasNoneOf, In, HasAll, IsEmpty, NotEmpty],
            ConstraintType::Link => &[Contains, NotContains, IsEmpty, NotEmpty],
            ConstraintType::Files => &[IsEmpty, NotEmpty],
            ConstraintType::Text
            | ConstraintType::Unknown
            | ConstraintType::Address
            | ConstraintType::Color
            | ConstraintType::Coordinates => &[
                Equals,
                NotEquals,
                Contains,
                NotContains,
                StartsWith,
                EndsWith,
                IsEmpty,
                NotEmpty,
            ],
        }
    }

    pub fn aggregations(&self) -> &'static [DataAggregationType] {
        use DataAggregationType::*;
        match self.kind() {
            ConstraintType::Number | ConstraintType::Percentage | ConstraintType::Duration => {
                &[Sum, Min, Max, Avg, Median, Count, Unique]
            }
            ConstraintType::Address
            | ConstraintType::DateTime
            | ConstraintType::Coordinates
            | ConstraintType::Link
            | ConstraintType::Select
            | ConstraintType::Text
            | ConstraintType::Unknown
            | ConstraintType::User
            | ConstraintType::View => &[Min, Max, Count, Unique, Join],
            ConstraintType::Action
            | ConstraintType::Boolean
            | ConstraintType::Color
            | ConstraintType::Files
            | ConstraintType::Team => &[],
        }
    }

    /// Stored values of `attribute_id` across `records` that reference no known
    /// option, user or team. Other kinds report nothing.
    pub fn filter_invalid_values<'r, I>(&self, records: I, attribute_id: &str, data: &ConstraintData) -> Vec<Value>
    where
        I: IntoIterator<Item = &'r DataMap>,
    {
        let is_valid: Box<dyn Fn(&Value) -> bool + '_> = match self {
            Constraint::Select(config) => {
                let options = match config.selection_list_id.as_deref().and_then(|id| data.find_selection_list(id)) {
                    Some(list) => &list.options,
                    None => &config.options,
                };
                Box::new(move |v| options.iter().any(|o| v.as_str() == Some(o.value.as_str())))
            }
            Constraint::User(_) => Box::new(move |v| match v {
                Value::String(s) => is_team_value(s) || data.find_user_by_email(s).is_some(),
                _ => false,
            }),
            Constraint::Team(_) => Box::new(move |v| match v {
                Value::String(s) => data.find_team(s).is_some(),
                _ => false,
            }),
            _ => return Vec::new(),
        };

        let mut invalid: Vec<Value> = Vec::new();
        for raw in records.into_iter().filter_map(|r| r.get(attribute_id)) {
            let values = match raw {
                Value::Null => continue,
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            };
            for value in values {
                if !is_valid(value) && !invalid.contains(value) {
                    invalid.push(value.clone());
                }
            }
        }
        invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumio_model::{SelectOption, User};
    use serde_json::json;

    #[test]
    fn number_inherits_locale() {
        let constraint = create_constraint(ConstraintType::Number, &json!({"decimals": 2}), LanguageTag::Slovak);
        match constraint {
            Constraint::Number(config) => {
                assert_eq!(config.locale, Some(LanguageTag::Slovak));
                assert_eq!(config.decimals, Some(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn every_kind_builds_its_own_value() {
        let data = ConstraintData::default();
        for kind in ConstraintType::ALL {
            let constraint = create_constraint(kind, &Value::Null, LanguageTag::default());
            assert_eq!(constraint.create_data_value(Value::Null, &data).kind(), kind);
        }
    }

    #[test]
    fn capability_tables() {
        let number = create_constraint(ConstraintType::Number, &Value::Null, LanguageTag::default());
        assert!(number.aggregations().contains(&DataAggregationType::Median));
        assert!(number.conditions().contains(&ConditionType::Between));
        assert!(Constraint::Team(Default::default()).aggregations().is_empty());
        assert_eq!(Constraint::Files.conditions(), &[ConditionType::IsEmpty, ConditionType::NotEmpty]);
    }

    #[test]
    fn invalid_values_by_directory() {
        let data = ConstraintData {
            users: vec![User::new("u1", "Ann", "ann@lumio.io")],
            ..Default::default()
        };
        let records: Vec<DataMap> = vec![
            json!({"a": ["ann@lumio.io", "zed@x.io"]}),
            json!({"a": "@t1"}),
            json!({"a": "zed@x.io"}),
            json!({"b": "other"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let user = Constraint::User(Default::default());
        assert_eq!(user.filter_invalid_values(&records, "a", &data), vec![json!("zed@x.io")]);

        let select = Constraint::Select(SelectConstraintConfig {
            options: vec![SelectOption::new("ann@lumio.io", None)],
            ..Default::default()
        });
        assert_eq!(
            select.filter_invalid_values(&records, "a", &data),
            vec![json!("zed@x.io"), json!("@t1")]
        );
    }
}
