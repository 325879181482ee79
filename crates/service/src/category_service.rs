use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ServiceError;
use models::{category, product};

pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>, ServiceError> {
    category::Entity::find()
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn get_category(db: &DatabaseConnection, id: Uuid) -> Result<category::Model, ServiceError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("category"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create_category(db: &DatabaseConnection, input: CategoryInput) -> Result<category::Model, ServiceError> {
    if category::find_by_name(db, &input.name).await?.is_some() {
        return Err(ServiceError::duplicate_name("category"));
    }
    Ok(category::create(db, &input.name, input.description.as_deref()).await?)
}

pub async fn update_category(db: &DatabaseConnection, id: Uuid, input: CategoryInput) -> Result<category::Model, ServiceError> {
    let row = get_category(db, id).await?;
    // The new name must not collide with another category
    if let Some(other) = category::find_by_name(db, &input.name).await? {
        if other.id != id {
            return Err(ServiceError::duplicate_name("category"));
        }
    }
    let mut am: category::ActiveModel = row.into();
    am.name = Set(input.name);
    am.description = Set(input.description);
    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

/// Delete a category; rejected while products still reference it.
pub async fn delete_category(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    get_category(db, id).await?;
    let in_use = product::Entity::find()
        .filter(product::Column::CategoryId.eq(id))
        .count(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    if in_use > 0 {
        return Err(ServiceError::Conflict("category still contains products".into()));
    }
    category::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(())
}
