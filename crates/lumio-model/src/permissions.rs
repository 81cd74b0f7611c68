use serde::{Deserialize, Serialize};

/// Roles a caller may hold on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleType {
    Read,
    Write,
    Manage,
    DataRead,
    DataWrite,
    DataDelete,
    DataContribute,
}

/// Boolean role flags, keyed the way they are stored (`DataRead`, `DataWrite`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RolesMap {
    pub read: bool,
    pub write: bool,
    pub manage: bool,
    pub data_read: bool,
    pub data_write: bool,
    pub data_delete: bool,
    pub data_contribute: bool,
}

impl RolesMap {
    pub fn has(&self, role: RoleType) -> bool {
        match role {
            RoleType::Read => self.read,
            RoleType::Write => self.write,
            RoleType::Manage => self.manage,
            RoleType::DataRead => self.data_read,
            RoleType::DataWrite => self.data_write,
            RoleType::DataDelete => self.data_delete,
            RoleType::DataContribute => self.data_contribute,
        }
    }
}

/// Permissions the caller holds on one collection or link type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllowedPermissions {
    pub roles: RolesMap,
    /// Roles including the ones granted through the current view.
    pub roles_with_view: RolesMap,
}

impl AllowedPermissions {
    pub fn with_view_roles(roles: &[RoleType]) -> Self {
        let mut map = RolesMap::default();
        for role in roles {
            match role {
                RoleType::Read => map.read = true,
                RoleType::Write => map.write = true,
                RoleType::Manage => map.manage = true,
                RoleType::DataRead => map.data_read = true,
                RoleType::DataWrite => map.data_write = true,
                RoleType::DataDelete => map.data_delete = true,
                RoleType::DataContribute => map.data_contribute = true,
            }
        }
        Self {
            roles: map,
            roles_with_view: map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_pascal_case_roles() {
        let permissions: AllowedPermissions =
            serde_json::from_value(json!({"rolesWithView": {"DataRead": true, "DataContribute": true}}))
                .unwrap();
        assert!(permissions.roles_with_view.has(RoleType::DataRead));
        assert!(permissions.roles_with_view.has(RoleType::DataContribute));
        assert!(!permissions.roles_with_view.has(RoleType::DataWrite));
        assert!(!permissions.roles.has(RoleType::DataRead));
    }
}
