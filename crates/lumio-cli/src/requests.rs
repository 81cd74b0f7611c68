//! JSON request bodies for the `aggregate` and `lock` commands.

use anyhow::{anyhow, bail, Result};
use lumio_engine::{
    compute_attribute_lock_stats, is_action_button_enabled, is_attribute_lock_enabled_by_stats,
    AttributeLockStats,
};
use lumio_model::de::null_default;
use lumio_model::{
    AllowedPermissions, AttributesResource, Collection, ConstraintData, ConstraintSpec, ConstraintType, DataResource,
    Document, LinkInstance, LinkType,
};
use lumio_values::{aggregate_data_values, Constraint, DataAggregationType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateRequest {
    #[serde(deserialize_with = "null_default")]
    pub values: Vec<Value>,
    pub constraint: Option<ConstraintSpec>,
    pub aggregation: Option<DataAggregationType>,
    pub only_numeric: bool,
    #[serde(deserialize_with = "null_default")]
    pub constraint_data: ConstraintData,
}

impl AggregateRequest {
    pub fn constraint(&self) -> Constraint {
        Constraint::from_spec(self.constraint.as_ref(), self.constraint_data.locale())
    }

    pub fn aggregate(&self, aggregation: DataAggregationType, constraint: &Constraint) -> Value {
        debug!(?aggregation, kind = %constraint.kind(), values = self.values.len(), "aggregating");
        aggregate_data_values(
            aggregation,
            &self.values,
            Some(constraint),
            self.only_numeric,
            &self.constraint_data,
        )
    }
}

/// One record with its resource: a document with its collection or a link
/// instance with its link type.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LockRequest {
    pub document: Option<Document>,
    pub collection: Option<Collection>,
    pub link_instance: Option<LinkInstance>,
    pub link_type: Option<LinkType>,
    pub attribute_id: String,
    pub permissions: Option<AllowedPermissions>,
    #[serde(deserialize_with = "null_default")]
    pub constraint_data: ConstraintData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockReport {
    pub attribute_id: String,
    pub editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_enabled: Option<bool>,
    pub stats: AttributeLockStats,
}

impl LockRequest {
    fn target(&self) -> Result<(DataResource<'_>, AttributesResource<'_>)> {
        match (&self.document, &self.collection, &self.link_instance, &self.link_type) {
            (Some(document), Some(collection), _, _) => {
                Ok((DataResource::Document(document), AttributesResource::Collection(collection)))
            }
            (_, _, Some(link), Some(link_type)) => {
                Ok((DataResource::Link(link), AttributesResource::LinkType(link_type)))
            }
            _ => bail!("lock request needs a document with its collection or a link instance with its link type"),
        }
    }

    pub fn evaluate(&self) -> Result<LockReport> {
        let (record, resource) = self.target()?;
        let attribute = resource
            .find_attribute(&self.attribute_id)
            .ok_or_else(|| anyhow!("attribute `{}` not found in `{}`", self.attribute_id, resource.id()))?;
        let data = &self.constraint_data;

        let stats = compute_attribute_lock_stats(record, resource, attribute.lock.as_ref(), data);
        let editable = is_attribute_lock_enabled_by_stats(attribute.lock.as_ref(), &stats);
        let is_action = attribute
            .constraint
            .as_ref()
            .is_some_and(|c| c.kind == ConstraintType::Action);
        let action_enabled =
            is_action.then(|| is_action_button_enabled(record, resource, attribute, self.permissions.as_ref(), data));

        Ok(LockReport {
            attribute_id: attribute.id.clone(),
            editable,
            action_enabled,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn aggregate_sums_exactly() {
        let request: AggregateRequest = serde_json::from_value(json!({
            "values": ["3.55", 3.67, 2, null],
            "constraint": {"type": "Number", "config": {}},
            "constraintData": null
        }))
        .unwrap();
        let constraint = request.constraint();
        assert_eq!(constraint.kind(), ConstraintType::Number);
        let sum = request.aggregate(DataAggregationType::Sum, &constraint);
        assert_eq!(sum.to_string().trim_matches('"'), "9.22");
        assert_eq!(request.aggregate(DataAggregationType::Count, &constraint), json!(4));
    }

    #[test]
    fn lock_request_needs_a_target() {
        let request = LockRequest {
            attribute_id: "a1".to_string(),
            ..Default::default()
        };
        assert!(request.evaluate().is_err());
    }

    #[test]
    fn lock_on_link_instance() {
        let request: LockRequest = serde_json::from_value(json!({
            "linkInstance": {"id": "l1", "linkTypeId": "lt1", "documentIds": ["d1", "d2"], "data": {"state": "done"}},
            "linkType": {"id": "lt1", "collectionIds": ["c1", "c2"], "attributes": [
                {"id": "state", "name": "State"},
                {"id": "note", "name": "Note", "lock": {"locked": true, "exceptionGroups": [
                    {"type": "everyone", "equation": {"equations": [
                        {"filter": {"attributeId": "state", "condition": "eq", "conditionValues": [{"value": "done"}]}}
                    ]}}
                ]}}
            ]},
            "attributeId": "note"
        }))
        .unwrap();
        let report = request.evaluate().unwrap();
        assert!(report.editable);
        assert!(report.stats.satisfy);
        assert_eq!(report.action_enabled, None);
    }
}
