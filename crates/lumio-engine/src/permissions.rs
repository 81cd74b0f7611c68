//! Role predicates over the permissions a caller holds on a resource.
//!
//! Only the action button evaluator consults these; record visibility inside
//! the filtering engine never depends on them.

use lumio_model::{
    AllowedPermissions, AttributesResource, ConstraintData, ConstraintType, DataResource,
    RoleType, User,
};
use lumio_values::{Constraint, DataValue};
use serde_json::Value;

/// Whether `user` may act on `record` in `role`.
///
/// Read and Write map to the data roles of the same name, Delete to
/// `DataDelete`. Contributors qualify on records they created; on task
/// collections the assignee qualifies as well. Any other role is refused.
pub fn has_role_by_permissions(
    role: RoleType,
    record: DataResource<'_>,
    resource: AttributesResource<'_>,
    permissions: &AllowedPermissions,
    user: Option<&User>,
    data: &ConstraintData,
) -> bool {
    let granted = match role {
        RoleType::Read | RoleType::DataRead => RoleType::DataRead,
        RoleType::Write | RoleType::DataWrite => RoleType::DataWrite,
        RoleType::DataDelete => RoleType::DataDelete,
        _ => return false,
    };
    let roles = &permissions.roles_with_view;
    if roles.has(granted) {
        return true;
    }
    if roles.has(RoleType::DataContribute) && is_owner(record, user) {
        return true;
    }
    match (record, resource) {
        (DataResource::Document(_), AttributesResource::Collection(_)) => {
            is_task_assignee(record, resource, user, data)
        }
        _ => false,
    }
}

fn is_owner(record: DataResource<'_>, user: Option<&User>) -> bool {
    match (record.created_by(), user.and_then(|u| u.id.as_deref())) {
        (Some(creator), Some(id)) => creator == id,
        _ => false,
    }
}

/// Whether `user` is among the assignees of a task document.
///
/// A User-typed assignee attribute counts team members too; any other kind
/// is read as a plain e-mail or a list of e-mails.
pub fn is_task_assignee(
    record: DataResource<'_>,
    resource: AttributesResource<'_>,
    user: Option<&User>,
    data: &ConstraintData,
) -> bool {
    let (Some(user), AttributesResource::Collection(collection)) = (user, resource) else {
        return false;
    };
    let Some(attribute) = collection
        .assignee_attribute_id()
        .and_then(|id| resource.find_attribute(id))
    else {
        return false;
    };
    let raw = record.data().get(&attribute.id).cloned().unwrap_or(Value::Null);

    match attribute.constraint.as_ref() {
        Some(spec) if spec.kind == ConstraintType::User => {
            let constraint = Constraint::from_spec(Some(spec), data.locale());
            let identity = user.id.as_deref().unwrap_or(&user.email);
            match constraint.create_data_value(raw, data) {
                DataValue::User(value) => value.all_users_ids().iter().any(|id| id == identity),
                _ => false,
            }
        }
        _ => match raw {
            Value::Array(items) => items.iter().any(|v| v.as_str() == Some(user.email.as_str())),
            Value::String(email) => email == user.email,
            _ => false,
        },
    }
}
