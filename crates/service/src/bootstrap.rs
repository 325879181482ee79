//! Idempotent startup seeding: base permissions, the three built-in roles
//! and the initial admin account.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

use crate::access::{ADMIN_ROLE, CLIENT_ROLE};
use crate::auth::service::hash_password;
use crate::errors::ServiceError;
use models::{permission, role, role_permission, user, user_credentials, user_role};

pub const VENDOR_ROLE: &str = "VENDEUR";

/// Wire-visible permission names with their descriptions.
pub const BASE_PERMISSIONS: &[(&str, &str)] = &[
    ("PRODUIT_READ", "Read products"),
    ("PRODUIT_CREATE", "Create products"),
    ("PRODUIT_UPDATE", "Update products"),
    ("PRODUIT_DELETE", "Delete products"),
    ("CATEGORIE_READ", "Read categories"),
    ("CATEGORIE_CREATE", "Create categories"),
    ("CATEGORIE_UPDATE", "Update categories"),
    ("CATEGORIE_DELETE", "Delete categories"),
    ("COMMANDE_READ", "Read all orders"),
    ("COMMANDE_UPDATE", "Update order status"),
    ("USER_READ", "Read users"),
    ("USER_CREATE", "Create users"),
    ("USER_UPDATE", "Update users"),
    ("USER_DELETE", "Delete users"),
    ("ROLE_READ", "Read roles"),
    ("ROLE_CREATE", "Create roles"),
    ("ROLE_UPDATE", "Update roles"),
    ("ROLE_DELETE", "Delete roles"),
    ("PERMISSION_READ", "Read permissions"),
    ("PERMISSION_CREATE", "Create permissions"),
    ("PERMISSION_UPDATE", "Update permissions"),
    ("PERMISSION_DELETE", "Delete permissions"),
    ("HISTORY_READ", "Read the action history"),
];

/// Permissions the vendor role holds.
const VENDOR_PERMISSIONS: &[&str] = &[
    "PRODUIT_READ", "PRODUIT_CREATE", "PRODUIT_UPDATE",
    "CATEGORIE_READ", "CATEGORIE_CREATE", "CATEGORIE_UPDATE",
    "COMMANDE_READ", "COMMANDE_UPDATE",
];

async fn ensure_permission(db: &DatabaseConnection, name: &str, description: &str) -> Result<permission::Model, ServiceError> {
    match permission::find_by_name(db, name).await? {
        Some(found) => Ok(found),
        None => Ok(permission::create(db, name, Some(description)).await?),
    }
}

async fn ensure_role(db: &DatabaseConnection, name: &str, description: &str) -> Result<role::Model, ServiceError> {
    match role::find_by_name(db, name).await? {
        Some(found) => Ok(found),
        None => Ok(role::create(db, name, Some(description)).await?),
    }
}

async fn ensure_grant(db: &DatabaseConnection, role_id: Uuid, permission_id: Uuid) -> Result<(), ServiceError> {
    let exists = role_permission::Entity::find()
        .filter(role_permission::Column::RoleId.eq(role_id))
        .filter(role_permission::Column::PermissionId.eq(permission_id))
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    if exists.is_none() {
        let link = role_permission::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
        };
        link.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    }
    Ok(())
}

/// Seed the RBAC graph and the initial admin account. Safe to run on every
/// startup.
pub async fn run(db: &DatabaseConnection) -> Result<(), ServiceError> {
    let mut permission_ids = Vec::with_capacity(BASE_PERMISSIONS.len());
    for (name, description) in BASE_PERMISSIONS {
        permission_ids.push(ensure_permission(db, name, description).await?.id);
    }

    let admin_role = ensure_role(db, ADMIN_ROLE, "Administrator with full permissions").await?;
    for id in &permission_ids {
        ensure_grant(db, admin_role.id, *id).await?;
    }

    ensure_role(db, CLIENT_ROLE, "Default customer role").await?;

    let vendor_role = ensure_role(db, VENDOR_ROLE, "Product and order manager").await?;
    for name in VENDOR_PERMISSIONS {
        let found = permission::find_by_name(db, name).await?
            .ok_or_else(|| ServiceError::not_found("permission"))?;
        ensure_grant(db, vendor_role.id, found.id).await?;
    }

    // Initial admin account; password overridable via ADMIN_PASSWORD
    let admin_email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    if user::find_by_email(db, &admin_email).await?.is_none() {
        let admin = user::create(db, "Admin", &admin_email).await?;
        let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
        let hash = hash_password(&password).map_err(|e| ServiceError::Validation(e.to_string()))?;
        user_credentials::upsert_password(db, admin.id, hash, "argon2").await?;
        let link = user_role::ActiveModel {
            user_id: Set(admin.id),
            role_id: Set(admin_role.id),
        };
        link.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
        info!(email = %admin_email, "admin_user_created");
    } else {
        info!(email = %admin_email, "admin_user_already_exists");
    }

    info!(permissions = BASE_PERMISSIONS.len(), "bootstrap_complete");
    Ok(())
}
