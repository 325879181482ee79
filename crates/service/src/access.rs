//! Access-control gate: resolves a user's effective permission set as the
//! union of its roles' permissions, with the admin role as a blanket pass.

use std::collections::HashSet;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::errors::ServiceError;
use models::{permission, role, role_permission, user, user_role};

/// Role name that passes every permission gate.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Default role assigned at signup.
pub const CLIENT_ROLE: &str = "CLIENT";

/// Resolved caller identity: user row plus role names and permission union.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: user::Model,
    pub roles: Vec<String>,
    pub permissions: HashSet<String>,
}

impl Identity {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r == name)
    }

    /// Permission gate: holds the permission, or holds `ADMIN`.
    pub fn can(&self, required: &str) -> bool {
        is_allowed(&self.roles, &self.permissions, required)
    }
}

/// Pure gate check used by [`Identity::can`]: the caller passes when the
/// required permission is in its union set, or it holds the admin role.
pub fn is_allowed(roles: &[String], permissions: &HashSet<String>, required: &str) -> bool {
    roles.iter().any(|r| r == ADMIN_ROLE) || permissions.contains(required)
}

/// Load the identity for a user id, or `None` when the user does not exist.
pub async fn load_identity(db: &DatabaseConnection, user_id: Uuid) -> Result<Option<Identity>, ServiceError> {
    let Some(found) = user::Entity::find_by_id(user_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
    else {
        return Ok(None);
    };

    let role_ids: Vec<Uuid> = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .into_iter()
        .map(|link| link.role_id)
        .collect();

    let mut roles = Vec::new();
    let mut permissions = HashSet::new();
    if !role_ids.is_empty() {
        roles = role::Entity::find()
            .filter(role::Column::Id.is_in(role_ids.clone()))
            .all(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .into_iter()
            .map(|r| r.name)
            .collect();

        let permission_ids: Vec<Uuid> = role_permission::Entity::find()
            .filter(role_permission::Column::RoleId.is_in(role_ids))
            .all(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .into_iter()
            .map(|link| link.permission_id)
            .collect();

        if !permission_ids.is_empty() {
            permissions = permission::Entity::find()
                .filter(permission::Column::Id.is_in(permission_ids))
                .all(db)
                .await
                .map_err(|e| ServiceError::Db(e.to_string()))?
                .into_iter()
                .map(|p| p.name)
                .collect();
        }
    }

    Ok(Some(Identity { user: found, roles, permissions }))
}

/// Union of permission names across all roles of a user.
pub async fn effective_permissions(db: &DatabaseConnection, user_id: Uuid) -> Result<HashSet<String>, ServiceError> {
    Ok(load_identity(db, user_id)
        .await?
        .map(|id| id.permissions)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn permission_in_union_passes() {
        let roles = vec!["VENDEUR".to_string()];
        assert!(is_allowed(&roles, &perms(&["PRODUIT_READ"]), "PRODUIT_READ"));
    }

    #[test]
    fn missing_permission_without_admin_is_denied() {
        let roles = vec!["CLIENT".to_string()];
        assert!(!is_allowed(&roles, &perms(&[]), "PRODUIT_DELETE"));
        assert!(!is_allowed(&roles, &perms(&["PRODUIT_READ"]), "PRODUIT_DELETE"));
    }

    #[test]
    fn admin_role_overrides_everything() {
        let roles = vec![ADMIN_ROLE.to_string()];
        assert!(is_allowed(&roles, &perms(&[]), "PERMISSION_DELETE"));
    }
}
