use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{extension::postgres::PgExpr, Expr};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::ServiceError;
use models::{category, product};

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<product::Model>, ServiceError> {
    product::Entity::find()
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Storefront listing: active products only.
pub async fn list_active(db: &DatabaseConnection) -> Result<Vec<product::Model>, ServiceError> {
    product::Entity::find()
        .filter(product::Column::Active.eq(true))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn get_product(db: &DatabaseConnection, id: Uuid) -> Result<product::Model, ServiceError> {
    product::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("product"))
}

pub async fn list_by_category(db: &DatabaseConnection, category_id: Uuid) -> Result<Vec<product::Model>, ServiceError> {
    product::Entity::find()
        .filter(product::Column::CategoryId.eq(category_id))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Case-insensitive substring search on the product name.
pub async fn search_by_name(db: &DatabaseConnection, query: &str) -> Result<Vec<product::Model>, ServiceError> {
    let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
    product::Entity::find()
        .filter(Expr::col(product::Column::Name).ilike(pattern))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    pub stock: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool { true }

async fn resolve_category(db: &DatabaseConnection, category_id: Option<Uuid>) -> Result<Option<Uuid>, ServiceError> {
    if let Some(id) = category_id {
        category::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .ok_or_else(|| ServiceError::not_found("category"))?;
    }
    Ok(category_id)
}

#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_product(
    db: &DatabaseConnection,
    input: ProductInput,
    category_id: Option<Uuid>,
) -> Result<product::Model, ServiceError> {
    let category_id = resolve_category(db, category_id).await?;
    Ok(product::create(db, product::NewProduct {
        name: &input.name,
        description: input.description.as_deref(),
        price: input.price,
        image_url: input.image_url.as_deref(),
        stock: input.stock,
        active: input.active,
        category_id,
    }).await?)
}

/// Full overwrite of the mutable product fields.
pub async fn update_product(
    db: &DatabaseConnection,
    id: Uuid,
    input: ProductInput,
    category_id: Option<Uuid>,
) -> Result<product::Model, ServiceError> {
    let row = get_product(db, id).await?;
    if input.name.trim().is_empty() {
        return Err(ServiceError::Validation("name required".into()));
    }
    if input.price < Decimal::ZERO {
        return Err(ServiceError::Validation("price must not be negative".into()));
    }
    if input.stock < 0 {
        return Err(ServiceError::Validation("stock must not be negative".into()));
    }
    let category_id = match category_id {
        Some(id) => resolve_category(db, Some(id)).await?,
        None => row.category_id,
    };

    let mut am: product::ActiveModel = row.into();
    am.name = Set(input.name);
    am.description = Set(input.description);
    am.price = Set(input.price);
    am.image_url = Set(input.image_url);
    am.stock = Set(input.stock);
    am.active = Set(input.active);
    am.category_id = Set(category_id);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

pub async fn delete_product(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    get_product(db, id).await?;
    product::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(())
}

pub async fn toggle_active(db: &DatabaseConnection, id: Uuid) -> Result<product::Model, ServiceError> {
    let row = get_product(db, id).await?;
    let active = row.active;
    let mut am: product::ActiveModel = row.into();
    am.active = Set(!active);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

/// Adjust stock by a signed delta; the result must stay non-negative.
pub async fn adjust_stock(db: &DatabaseConnection, id: Uuid, delta: i32) -> Result<product::Model, ServiceError> {
    let row = get_product(db, id).await?;
    Ok(models::product::set_stock(db, id, row.stock + delta).await?)
}
