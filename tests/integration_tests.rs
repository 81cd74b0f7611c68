//! Integration tests across the Lumio crates
//!
//! These tests follow one workflow end to end:
//! - JSON envelope on disk → filter engine → accepted ids
//! - accepted records → typed values → aggregation
//! - accepted records → attribute locks and action buttons
//!
//! Run with: cargo test --test integration_tests

use lumio_engine::{is_action_button_enabled, is_attribute_editable, FilterEnvelope};
use lumio_model::{AllowedPermissions, AttributesResource, DataResource, RoleType, User};
use lumio_values::{aggregate_data_values, Constraint, DataAggregationType};
use serde_json::{json, Value};
use tempfile::tempdir;

fn envelope() -> Value {
    json!({
        "documents": [
            {"id": "t1", "collectionId": "tasks", "createdBy": "u1",
             "data": {"title": "Write report", "hours": "3.55", "state": "open", "owner": "ann@lumio.io"}},
            {"id": "t2", "collectionId": "tasks", "createdBy": "u2",
             "data": {"title": "Review report", "hours": 3.67, "state": "done", "owner": "bob@lumio.io"}},
            {"id": "t3", "collectionId": "tasks", "createdBy": "u1",
             "data": {"title": "Plan sprint", "hours": "2", "state": "open", "owner": "ann@lumio.io"},
             "metaData": {"parentId": "t1"}},
            {"id": "t4", "collectionId": "tasks", "createdBy": "u2",
             "data": {"title": "Archive", "hours": null, "state": "done", "owner": "bob@lumio.io"}}
        ],
        "collections": [{
            "id": "tasks",
            "purpose": {"type": "Tasks", "metaData": {"assigneeAttributeId": "owner"}},
            "attributes": [
                {"id": "title", "name": "Title"},
                {"id": "hours", "name": "Hours", "constraint": {"type": "Number", "config": {"decimals": 2}}},
                {"id": "state", "name": "State",
                 "constraint": {"type": "Select", "config": {"options": [{"value": "open"}, {"value": "done"}]}}},
                {"id": "owner", "name": "Owner", "constraint": {"type": "User", "config": {}}},
                {"id": "close", "name": "Close",
                 "constraint": {"type": "Action", "config": {"title": "Close", "role": "Write"}},
                 "lock": {"locked": false, "exceptionGroups": [
                    {"type": "everyone", "equation": {"equations": [
                        {"filter": {"attributeId": "state", "condition": "hasSome", "conditionValues": [{"value": "open"}]}}
                    ]}}
                 ]}}
            ]
        }],
        "query": {"fulltexts": ["report"]},
        "constraintData": {
            "users": [
                {"id": "u1", "name": "Ann", "email": "ann@lumio.io"},
                {"id": "u2", "name": "Bob", "email": "bob@lumio.io"}
            ],
            "currentUser": {"id": "u1", "name": "Ann", "email": "ann@lumio.io"}
        },
        "includeChildren": true
    })
}

fn load() -> FilterEnvelope {
    let dir = tempdir().unwrap();
    let path = dir.path().join("envelope.json");
    std::fs::write(&path, serde_json::to_string_pretty(&envelope()).unwrap()).unwrap();
    FilterEnvelope::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap()
}

// ============================================================================
// Filter → aggregate
// ============================================================================

#[test]
fn test_fulltext_with_children_then_sum() {
    let envelope = load();
    let ids = envelope.evaluate();
    assert_eq!(ids.documents_ids, vec!["t1", "t3", "t2"]);

    let collection = &envelope.collections[0];
    let hours = collection.attributes.iter().find(|a| a.id == "hours").unwrap();
    let constraint = Constraint::from_spec(hours.constraint.as_ref(), envelope.constraint_data.locale());
    let values: Vec<Value> = envelope
        .documents
        .iter()
        .filter(|d| ids.documents_ids.contains(&d.id))
        .map(|d| d.data.get("hours").cloned().unwrap_or(Value::Null))
        .collect();

    let sum = aggregate_data_values(DataAggregationType::Sum, &values, Some(&constraint), false, &envelope.constraint_data);
    assert_eq!(sum, json!(9.22));
    let count = aggregate_data_values(DataAggregationType::Count, &values, Some(&constraint), false, &envelope.constraint_data);
    assert_eq!(count, json!(3));
}

#[test]
fn test_filter_by_current_user_assignee() {
    let mut envelope = load();
    envelope.query = serde_json::from_value(json!({
        "stems": [{"collectionId": "tasks", "filters": [
            {"collectionId": "tasks", "attributeId": "owner", "condition": "hasSome",
             "conditionValues": [{"type": "currentUser"}]}
        ]}]
    }))
    .unwrap();
    envelope.options.include_children = false;
    assert_eq!(envelope.evaluate().documents_ids, vec!["t1", "t3"]);
}

// ============================================================================
// Locks and actions
// ============================================================================

#[test]
fn test_action_follows_state_and_permissions() {
    let envelope = load();
    let collection = &envelope.collections[0];
    let close = collection.attributes.iter().find(|a| a.id == "close").unwrap();
    let resource = AttributesResource::Collection(collection);
    let data = &envelope.constraint_data;
    let doc = |id: &str| envelope.documents.iter().find(|d| d.id == id).unwrap();

    // open tasks unlock the button, done ones keep it closed
    assert!(is_action_button_enabled(DataResource::Document(doc("t1")), resource, close, None, data));
    assert!(!is_action_button_enabled(DataResource::Document(doc("t2")), resource, close, None, data));

    // contributors may act on their own tasks and on tasks assigned to them
    let contributor = AllowedPermissions::with_view_roles(&[RoleType::DataContribute]);
    assert!(is_action_button_enabled(DataResource::Document(doc("t1")), resource, close, Some(&contributor), data));

    let mut as_bob = data.clone();
    as_bob.current_user = Some(User::new("u2", "Bob", "bob@lumio.io"));
    assert!(!is_action_button_enabled(DataResource::Document(doc("t1")), resource, close, Some(&contributor), &as_bob));
    let writer = AllowedPermissions::with_view_roles(&[RoleType::DataWrite]);
    assert!(is_action_button_enabled(DataResource::Document(doc("t1")), resource, close, Some(&writer), &as_bob));
}

#[test]
fn test_attributes_without_lock_stay_editable() {
    let envelope = load();
    let collection = &envelope.collections[0];
    let resource = AttributesResource::Collection(collection);
    let record = DataResource::Document(&envelope.documents[0]);
    for attribute in collection.attributes.iter().filter(|a| a.lock.is_none()) {
        assert!(is_attribute_editable(record, resource, attribute, &envelope.constraint_data), "{}", attribute.id);
    }
}
