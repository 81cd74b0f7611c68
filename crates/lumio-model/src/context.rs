//! Contextual reference data consulted while evaluating values.
//!
//! A [`ConstraintData`] snapshot is passed explicitly into every evaluation call
//! and is never mutated by it.

use crate::constraint::SelectOption;
use crate::de::null_default;
use crate::language::LanguageTag;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: String,
}

impl User {
    pub fn new(id: &str, name: &str, email: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            email: email.to_string(),
        }
    }

    pub fn with_email(email: &str) -> Self {
        Self {
            email: email.to_string(),
            ..Default::default()
        }
    }

    /// Display name, falling back to the e-mail.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Team {
    pub id: String,
    pub name: String,
    /// Member user ids.
    #[serde(deserialize_with = "null_default")]
    pub users: Vec<String>,
}

impl Team {
    pub fn new(id: &str, name: &str, users: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            users: users.iter().map(|u| u.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct View {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionList {
    pub id: String,
    pub name: String,
    pub display_values: bool,
    #[serde(deserialize_with = "null_default")]
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrencyData {
    /// Thousand, million, billion, trillion.
    #[serde(deserialize_with = "null_default")]
    pub abbreviations: Vec<String>,
    /// Suffixes for 1, 2, 3 and the rest.
    #[serde(deserialize_with = "null_default")]
    pub ordinals: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub continent: Option<String>,
}

/// Read-only evaluation context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintData {
    #[serde(deserialize_with = "null_default")]
    pub users: Vec<User>,
    #[serde(deserialize_with = "null_default")]
    pub teams: Vec<Team>,
    pub current_user: Option<User>,
    #[serde(deserialize_with = "null_default")]
    pub views: Vec<View>,
    #[serde(deserialize_with = "null_default")]
    pub selection_lists: Vec<SelectionList>,
    /// Native duration unit letter → translated letter.
    #[serde(deserialize_with = "null_default")]
    pub duration_units_map: AHashMap<String, String>,
    pub currency_data: Option<CurrencyData>,
    #[serde(deserialize_with = "null_default")]
    pub addresses_map: AHashMap<String, Vec<Address>>,
    /// Offset of the active timezone from UTC, in minutes.
    pub timezone_offset: Option<i32>,
    pub locale: Option<LanguageTag>,
}

impl ConstraintData {
    pub fn find_user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn find_team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn find_view(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn find_selection_list(&self, id: &str) -> Option<&SelectionList> {
        self.selection_lists.iter().find(|l| l.id == id)
    }

    /// Teams whose member list contains the current user's id.
    pub fn current_user_teams(&self) -> Vec<&Team> {
        let Some(user_id) = self.current_user.as_ref().and_then(|u| u.id.as_deref()) else {
            return Vec::new();
        };
        self.teams
            .iter()
            .filter(|t| t.users.iter().any(|u| u == user_id))
            .collect()
    }

    pub fn locale(&self) -> LanguageTag {
        self.locale.unwrap_or_default()
    }
}
