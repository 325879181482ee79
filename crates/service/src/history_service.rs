use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::errors::ServiceError;
use models::action_log;

/// Append an audit entry; failures are reported but must not break the
/// calling workflow, so handlers typically log and continue.
pub async fn record(db: &DatabaseConnection, user_id: Uuid, action: &str) -> Result<action_log::Model, ServiceError> {
    Ok(action_log::create(db, user_id, action).await?)
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<action_log::Model>, ServiceError> {
    action_log::Entity::find()
        .order_by_desc(action_log::Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn get_entry(db: &DatabaseConnection, id: Uuid) -> Result<action_log::Model, ServiceError> {
    action_log::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("history entry"))
}

pub async fn list_by_user(db: &DatabaseConnection, user_id: Uuid) -> Result<Vec<action_log::Model>, ServiceError> {
    action_log::Entity::find()
        .filter(action_log::Column::UserId.eq(user_id))
        .order_by_desc(action_log::Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn delete_entry(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    get_entry(db, id).await?;
    action_log::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(())
}
