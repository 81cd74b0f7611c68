//! Attributes resources (collections, link types) and data resources
//! (documents, link instances).

use crate::constraint::ConstraintSpec;
use crate::de::null_default;
use crate::lock::AttributeLock;
use crate::DataMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Attributes resources
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ConstraintSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<AttributeLock>,
}

impl Attribute {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_constraint(mut self, constraint: ConstraintSpec) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionPurposeType {
    None,
    Tasks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPurposeMetadata {
    #[serde(default)]
    pub assignee_attribute_id: Option<String>,
    #[serde(default)]
    pub due_date_attribute_id: Option<String>,
    #[serde(default)]
    pub state_attribute_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPurpose {
    #[serde(rename = "type")]
    pub kind: CollectionPurposeType,
    #[serde(default)]
    pub meta_data: Option<CollectionPurposeMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<CollectionPurpose>,
}

impl Collection {
    pub fn new(id: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            id: id.into(),
            attributes,
            ..Default::default()
        }
    }

    /// Assignee attribute id when the collection is a task list.
    pub fn assignee_attribute_id(&self) -> Option<&str> {
        let purpose = self.purpose.as_ref()?;
        if purpose.kind != CollectionPurposeType::Tasks {
            return None;
        }
        purpose.meta_data.as_ref()?.assignee_attribute_id.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkType {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub collection_ids: [String; 2],
    #[serde(default, deserialize_with = "null_default")]
    pub attributes: Vec<Attribute>,
}

impl LinkType {
    pub fn new(id: impl Into<String>, collection_ids: [&str; 2], attributes: Vec<Attribute>) -> Self {
        Self {
            id: id.into(),
            name: None,
            collection_ids: [collection_ids[0].to_string(), collection_ids[1].to_string()],
            attributes,
        }
    }

    /// The collection on the other side of `collection_id`; the first one
    /// when `collection_id` is not an endpoint.
    pub fn other_collection_id(&self, collection_id: &str) -> &str {
        if self.collection_ids[0] == collection_id {
            &self.collection_ids[1]
        } else {
            &self.collection_ids[0]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributesResourceType {
    Collection,
    LinkType,
}

/// Either side of a query pipeline stage.
#[derive(Debug, Clone, Copy)]
pub enum AttributesResource<'a> {
    Collection(&'a Collection),
    LinkType(&'a LinkType),
}

impl<'a> AttributesResource<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            AttributesResource::Collection(c) => &c.id,
            AttributesResource::LinkType(l) => &l.id,
        }
    }

    pub fn attributes(&self) -> &'a [Attribute] {
        match self {
            AttributesResource::Collection(c) => &c.attributes,
            AttributesResource::LinkType(l) => &l.attributes,
        }
    }

    pub fn resource_type(&self) -> AttributesResourceType {
        match self {
            AttributesResource::Collection(_) => AttributesResourceType::Collection,
            AttributesResource::LinkType(_) => AttributesResourceType::LinkType,
        }
    }

    pub fn find_attribute(&self, attribute_id: &str) -> Option<&'a Attribute> {
        self.attributes().iter().find(|a| a.id == attribute_id)
    }
}

// ============================================================================
// Data resources
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetaData {
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub collection_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub data: DataMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<DocumentMetaData>,
}

impl Document {
    pub fn new(id: impl Into<String>, collection_id: impl Into<String>, data: DataMap) -> Self {
        Self {
            id: id.into(),
            collection_id: collection_id.into(),
            data,
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.meta_data = Some(DocumentMetaData {
            parent_id: Some(parent_id.into()),
        });
        self
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.meta_data.as_ref()?.parent_id.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInstance {
    pub id: String,
    pub link_type_id: String,
    pub document_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub data: DataMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl LinkInstance {
    pub fn new(id: impl Into<String>, link_type_id: impl Into<String>, document_ids: [&str; 2]) -> Self {
        Self {
            id: id.into(),
            link_type_id: link_type_id.into(),
            document_ids: document_ids.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn has_valid_endpoints(&self) -> bool {
        self.document_ids.len() == 2
    }

    pub fn connects(&self, document_id: &str) -> bool {
        self.document_ids.iter().any(|id| id == document_id)
    }
}

/// A document or a link instance seen through its shared fields.
#[derive(Debug, Clone, Copy)]
pub enum DataResource<'a> {
    Document(&'a Document),
    Link(&'a LinkInstance),
}

impl<'a> DataResource<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            DataResource::Document(d) => &d.id,
            DataResource::Link(l) => &l.id,
        }
    }

    pub fn data(&self) -> &'a DataMap {
        match self {
            DataResource::Document(d) => &d.data,
            DataResource::Link(l) => &l.data,
        }
    }

    pub fn created_by(&self) -> Option<&'a str> {
        match self {
            DataResource::Document(d) => d.created_by.as_deref(),
            DataResource::Link(l) => l.created_by.as_deref(),
        }
    }
}
