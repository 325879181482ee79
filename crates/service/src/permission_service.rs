use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ServiceError;
use models::permission;

pub async fn list_permissions(db: &DatabaseConnection) -> Result<Vec<permission::Model>, ServiceError> {
    permission::Entity::find()
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn get_permission(db: &DatabaseConnection, id: Uuid) -> Result<permission::Model, ServiceError> {
    permission::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("permission"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create_permission(db: &DatabaseConnection, input: PermissionInput) -> Result<permission::Model, ServiceError> {
    if permission::find_by_name(db, &input.name).await?.is_some() {
        return Err(ServiceError::duplicate_name("permission"));
    }
    Ok(permission::create(db, &input.name, input.description.as_deref()).await?)
}

pub async fn update_permission(db: &DatabaseConnection, id: Uuid, input: PermissionInput) -> Result<permission::Model, ServiceError> {
    let row = get_permission(db, id).await?;
    if let Some(other) = permission::find_by_name(db, &input.name).await? {
        if other.id != id {
            return Err(ServiceError::duplicate_name("permission"));
        }
    }
    let mut am: permission::ActiveModel = row.into();
    am.name = Set(input.name);
    am.description = Set(input.description);
    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn delete_permission(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    get_permission(db, id).await?;
    permission::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(())
}
