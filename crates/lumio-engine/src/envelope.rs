//! JSON envelope for callers across a process boundary.
//!
//! One serialized object bundles the records, schema, query, permissions,
//! context and options; the answer is the ids of the accepted documents and
//! link instances.

use crate::filter::{filter_documents_and_links_by_query, FilterInput};
use crate::options::EngineOptions;
use ahash::AHashMap;
use lumio_model::de::null_default;
use lumio_model::{
    AllowedPermissions, Collection, ConstraintData, Document, LinkInstance, LinkType, ModelError, Query,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed filter envelope: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterEnvelope {
    #[serde(deserialize_with = "null_default")]
    pub documents: Vec<Document>,
    #[serde(deserialize_with = "null_default")]
    pub link_instances: Vec<LinkInstance>,
    #[serde(deserialize_with = "null_default")]
    pub collections: Vec<Collection>,
    #[serde(deserialize_with = "null_default")]
    pub link_types: Vec<LinkType>,
    #[serde(deserialize_with = "null_default")]
    pub query: Query,
    #[serde(deserialize_with = "null_default")]
    pub collections_permissions: AHashMap<String, AllowedPermissions>,
    #[serde(deserialize_with = "null_default")]
    pub link_type_permissions: AHashMap<String, AllowedPermissions>,
    #[serde(deserialize_with = "null_default")]
    pub constraint_data: ConstraintData,
    #[serde(flatten)]
    pub options: EngineOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredIds {
    pub documents_ids: Vec<String>,
    pub link_instances_ids: Vec<String>,
}

impl FilterEnvelope {
    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        let mut envelope: FilterEnvelope = serde_json::from_str(json)?;
        envelope.link_instances = valid_link_instances(std::mem::take(&mut envelope.link_instances));
        debug!(
            documents = envelope.documents.len(),
            links = envelope.link_instances.len(),
            collections = envelope.collections.len(),
            "envelope decoded"
        );
        Ok(envelope)
    }

    /// Runs the query with the envelope's own options.
    pub fn evaluate(&self) -> FilteredIds {
        let input = FilterInput::new(&self.documents, &self.collections, &self.constraint_data)
            .with_links(&self.link_types, &self.link_instances)
            .with_permissions(&self.collections_permissions, &self.link_type_permissions);
        let (documents, links) = filter_documents_and_links_by_query(input, &self.query, &self.options);
        FilteredIds {
            documents_ids: documents.into_iter().map(|d| d.id.clone()).collect(),
            link_instances_ids: links.into_iter().map(|l| l.id.clone()).collect(),
        }
    }
}

/// Link instances must reference exactly two documents; the rest are skipped.
fn valid_link_instances(links: Vec<LinkInstance>) -> Vec<LinkInstance> {
    links
        .into_iter()
        .filter(|link| {
            if link.has_valid_endpoints() {
                return true;
            }
            let error = ModelError::LinkEndpoints {
                id: link.id.clone(),
                found: link.document_ids.len(),
            };
            warn!(%error, "skipping link instance");
            false
        })
        .collect()
}

pub fn filter_documents_and_links_ids_from_json(json: &str) -> Result<FilteredIds, EnvelopeError> {
    Ok(FilterEnvelope::from_json(json)?.evaluate())
}
