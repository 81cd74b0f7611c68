//! Engine switches.

use lumio_model::LanguageTag;
use serde::{Deserialize, Serialize};

/// Switches that change what the filtering engine admits.
///
/// Decoded from the JSON envelope (camelCase, every field optional) and
/// overridable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Admit the transitive children of every accepted base-stage document.
    pub include_children: bool,
    /// Admit downstream documents that match their own stage in isolation.
    pub include_non_linked_documents: bool,
    /// Locale for constraints that do not carry their own.
    pub language: Option<LanguageTag>,
}

impl EngineOptions {
    pub fn language(&self) -> LanguageTag {
        self.language.unwrap_or_default()
    }
}
