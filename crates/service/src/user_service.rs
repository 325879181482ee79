use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::service::hash_password;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use models::{role, user, user_credentials, user_role};

/// User with its role names, the shape the admin endpoints return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub roles: Vec<String>,
}

fn to_view(row: user::Model, roles: Vec<role::Model>) -> UserView {
    UserView {
        id: row.id,
        name: row.name,
        email: row.email,
        active: row.active,
        roles: roles.into_iter().map(|r| r.name).collect(),
    }
}

/// List all users with their roles.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<UserView>, ServiceError> {
    let rows = user::Entity::find()
        .find_with_related(role::Entity)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(rows.into_iter().map(|(u, roles)| to_view(u, roles)).collect())
}

/// List users with pagination (roles resolved per page).
pub async fn list_users_paginated(db: &DatabaseConnection, opts: Pagination) -> Result<Vec<UserView>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    let rows = user::Entity::find()
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let roles = row
            .find_related(role::Entity)
            .all(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        views.push(to_view(row, roles));
    }
    Ok(views)
}

/// Get a user by id, with roles.
pub async fn get_user(db: &DatabaseConnection, id: Uuid) -> Result<UserView, ServiceError> {
    let row = user::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    let roles = row
        .find_related(role::Entity)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(to_view(row, roles))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Create a user with a hashed password. Duplicate emails are rejected.
pub async fn create_user(db: &DatabaseConnection, input: CreateUserInput) -> Result<UserView, ServiceError> {
    if user::find_by_email(db, &input.email).await?.is_some() {
        return Err(ServiceError::Conflict("a user with this email already exists".into()));
    }
    if input.password.len() < 8 {
        return Err(ServiceError::Validation("password too short (>=8)".into()));
    }
    let created = user::create(db, &input.name, &input.email).await?;
    let hash = hash_password(&input.password).map_err(|e| ServiceError::Validation(e.to_string()))?;
    user_credentials::upsert_password(db, created.id, hash, "argon2").await?;
    Ok(to_view(created, Vec::new()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    pub active: bool,
}

/// Overwrite name/email/active; password only when provided.
pub async fn update_user(db: &DatabaseConnection, id: Uuid, input: UpdateUserInput) -> Result<UserView, ServiceError> {
    user::validate_email(&input.email)?;
    user::validate_name(&input.name)?;
    let row = user::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    if let Some(other) = user::find_by_email(db, &input.email).await? {
        if other.id != id {
            return Err(ServiceError::Conflict("a user with this email already exists".into()));
        }
    }
    if let Some(password) = input.password.as_deref() {
        if !password.is_empty() && password.len() < 8 {
            return Err(ServiceError::Validation("password too short (>=8)".into()));
        }
    }

    let mut am: user::ActiveModel = row.into();
    am.name = Set(input.name);
    am.email = Set(input.email);
    am.active = Set(input.active);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    if let Some(password) = input.password.filter(|p| !p.is_empty()) {
        let hash = hash_password(&password).map_err(|e| ServiceError::Validation(e.to_string()))?;
        user_credentials::upsert_password(db, id, hash, "argon2").await?;
    }
    get_user(db, updated.id).await
}

pub async fn delete_user(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    user::hard_delete(db, id).await?;
    Ok(())
}

/// Flip the active flag.
pub async fn toggle_active(db: &DatabaseConnection, id: Uuid) -> Result<UserView, ServiceError> {
    let row = user::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    let active = row.active;
    let mut am: user::ActiveModel = row.into();
    am.active = Set(!active);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    get_user(db, id).await
}

pub async fn assign_role(db: &DatabaseConnection, user_id: Uuid, role_id: Uuid) -> Result<UserView, ServiceError> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    role::Entity::find_by_id(role_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("role"))?;

    let already = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .filter(user_role::Column::RoleId.eq(role_id))
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    if already.is_none() {
        let link = user_role::ActiveModel { user_id: Set(user_id), role_id: Set(role_id) };
        link.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    }
    get_user(db, user_id).await
}

pub async fn remove_role(db: &DatabaseConnection, user_id: Uuid, role_id: Uuid) -> Result<UserView, ServiceError> {
    user_role::Entity::delete_many()
        .filter(user_role::Column::UserId.eq(user_id))
        .filter(user_role::Column::RoleId.eq(role_id))
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    get_user(db, user_id).await
}
