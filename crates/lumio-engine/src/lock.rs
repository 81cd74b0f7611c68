//! Attribute locks and action buttons.
//!
//! A lock lists exception groups. Each group that applies to the current user
//! evaluates its filter equation against the record; the lock statistics hold
//! when any applicable group holds. A locked attribute is editable exactly
//! when the statistics hold, an unlocked one exactly when they do not.

use crate::evaluate::{RecordEvaluator, ResourceSchema};
use lumio_model::{
    AllowedPermissions, Attribute, AttributeFilter, AttributeLock, AttributeLockExceptionGroup,
    AttributesResource, ConstraintData, DataResource,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeLockFilterStats {
    pub filter: AttributeFilter,
    pub satisfy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeLockGroupStats {
    pub exception_group: AttributeLockExceptionGroup,
    /// One entry per filter whose attribute exists.
    pub filters_stats: Vec<AttributeLockFilterStats>,
    pub satisfy: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeLockStats {
    pub satisfy: bool,
    /// Applicable groups only, in declaration order.
    pub groups: Vec<AttributeLockGroupStats>,
}

pub fn compute_attribute_lock_stats(
    record: DataResource<'_>,
    resource: AttributesResource<'_>,
    lock: Option<&AttributeLock>,
    data: &ConstraintData,
) -> AttributeLockStats {
    let schema = ResourceSchema::new(resource, data.locale());
    RecordEvaluator::new(&schema, record, data).lock_stats(lock)
}

pub fn is_attribute_lock_enabled_by_stats(lock: Option<&AttributeLock>, stats: &AttributeLockStats) -> bool {
    if lock.is_some_and(|l| l.locked) {
        stats.satisfy
    } else {
        !stats.satisfy
    }
}

pub fn is_attribute_editable(
    record: DataResource<'_>,
    resource: AttributesResource<'_>,
    attribute: &Attribute,
    data: &ConstraintData,
) -> bool {
    let stats = compute_attribute_lock_stats(record, resource, attribute.lock.as_ref(), data);
    is_attribute_lock_enabled_by_stats(attribute.lock.as_ref(), &stats)
}

/// Whether the action attribute's button is enabled: its lock statistics
/// hold and, when permissions are given, the current user holds the action's
/// role (Write unless configured) on the record.
pub fn is_action_button_enabled(
    record: DataResource<'_>,
    resource: AttributesResource<'_>,
    attribute: &Attribute,
    permissions: Option<&AllowedPermissions>,
    data: &ConstraintData,
) -> bool {
    let schema = ResourceSchema::new(resource, data.locale());
    RecordEvaluator::new(&schema, record, data)
        .with_permissions(permissions)
        .is_action_enabled(attribute)
}
