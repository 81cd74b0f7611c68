use crate::de::null_default;
use crate::query::AttributeFilterEquation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeLockGroupType {
    Everyone,
    UsersAndTeams,
}

/// Scope of an exception: everyone, or the users/teams listed in `type_value`
/// (team ids carry an `@` prefix).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttributeLockExceptionGroup {
    #[serde(rename = "type")]
    pub kind: Option<AttributeLockGroupType>,
    #[serde(deserialize_with = "null_default")]
    pub type_value: Vec<String>,
    pub equation: Option<AttributeFilterEquation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttributeLock {
    pub locked: bool,
    #[serde(deserialize_with = "null_default")]
    pub exception_groups: Vec<AttributeLockExceptionGroup>,
}
