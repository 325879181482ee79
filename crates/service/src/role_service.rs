use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use models::{permission, role, role_permission};

/// Role with its permissions, the shape the admin endpoints return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<permission::Model>,
}

fn to_view(row: role::Model, permissions: Vec<permission::Model>) -> RoleView {
    RoleView { id: row.id, name: row.name, description: row.description, permissions }
}

pub async fn list_roles(db: &DatabaseConnection) -> Result<Vec<RoleView>, ServiceError> {
    let rows = role::Entity::find()
        .find_with_related(permission::Entity)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(rows.into_iter().map(|(r, perms)| to_view(r, perms)).collect())
}

pub async fn get_role(db: &DatabaseConnection, id: Uuid) -> Result<RoleView, ServiceError> {
    let row = role::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("role"))?;
    let permissions = row
        .find_related(permission::Entity)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(to_view(row, permissions))
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create_role(db: &DatabaseConnection, input: RoleInput) -> Result<RoleView, ServiceError> {
    if role::find_by_name(db, &input.name).await?.is_some() {
        return Err(ServiceError::duplicate_name("role"));
    }
    let created = role::create(db, &input.name, input.description.as_deref()).await?;
    Ok(to_view(created, Vec::new()))
}

pub async fn update_role(db: &DatabaseConnection, id: Uuid, input: RoleInput) -> Result<RoleView, ServiceError> {
    let row = role::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("role"))?;
    if let Some(other) = role::find_by_name(db, &input.name).await? {
        if other.id != id {
            return Err(ServiceError::duplicate_name("role"));
        }
    }
    let mut am: role::ActiveModel = row.into();
    am.name = Set(input.name);
    am.description = Set(input.description);
    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    get_role(db, id).await
}

pub async fn delete_role(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    role::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("role"))?;
    role::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(())
}

pub async fn add_permission(db: &DatabaseConnection, role_id: Uuid, permission_id: Uuid) -> Result<RoleView, ServiceError> {
    role::Entity::find_by_id(role_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("role"))?;
    permission::Entity::find_by_id(permission_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("permission"))?;

    let already = role_permission::Entity::find()
        .filter(role_permission::Column::RoleId.eq(role_id))
        .filter(role_permission::Column::PermissionId.eq(permission_id))
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    if already.is_none() {
        let link = role_permission::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
        };
        link.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    }
    get_role(db, role_id).await
}

pub async fn remove_permission(db: &DatabaseConnection, role_id: Uuid, permission_id: Uuid) -> Result<RoleView, ServiceError> {
    role_permission::Entity::delete_many()
        .filter(role_permission::Column::RoleId.eq(role_id))
        .filter(role_permission::Column::PermissionId.eq(permission_id))
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    get_role(db, role_id).await
}
