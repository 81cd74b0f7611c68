//! Lumio data model
//!
//! Plain serde types shared by every Lumio crate:
//! - **Resources**: collections, link types and their attributes
//! - **Data resources**: documents and link instances
//! - **Constraints**: the type tag plus raw configuration blob attached to an attribute,
//!   and the typed configuration records decoded from it
//! - **Queries**: stems, attribute filters, filter equations and condition values
//! - **Locks**: attribute locks with exception groups
//! - **Context**: users, teams, views, selection lists and locale data consulted
//!   while evaluating values
//!
//! All types are read-only inputs; nothing here evaluates anything.

pub mod constraint;
pub mod context;
pub mod error;
pub mod language;
pub mod lock;
pub mod permissions;
pub mod query;
pub mod resource;

pub use constraint::*;
pub use context::*;
pub use error::ModelError;
pub use language::LanguageTag;
pub use lock::*;
pub use permissions::*;
pub use query::*;
pub use resource::*;

/// Attribute id → raw stored value.
pub type DataMap = serde_json::Map<String, serde_json::Value>;

/// Lenient field decoders for JSON produced by loosely typed clients.
pub mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accepts strings, numbers and booleans where a string is expected.
    pub fn stringish<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    pub fn opt_stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        })
    }

    /// `null` decodes to the type's default instead of failing.
    pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}
