use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category;
use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock: i32,
    pub active: bool,
    pub category_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Category }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Category => Entity::belongs_to(category::Entity)
                .from(Column::CategoryId)
                .to(category::Column::Id)
                .into(),
        }
    }
}

impl Related<category::Entity> for Entity {
    fn to() -> RelationDef { Relation::Category.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub struct NewProduct<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price: Decimal,
    pub image_url: Option<&'a str>,
    pub stock: i32,
    pub active: bool,
    pub category_id: Option<Uuid>,
}

pub async fn create(db: &DatabaseConnection, input: NewProduct<'_>) -> Result<Model, errors::ModelError> {
    if input.name.trim().is_empty() { return Err(errors::ModelError::Validation("name required".into())); }
    if input.price < Decimal::ZERO { return Err(errors::ModelError::Validation("price must not be negative".into())); }
    if input.stock < 0 { return Err(errors::ModelError::Validation("stock must not be negative".into())); }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.to_string()),
        description: Set(input.description.map(|d| d.to_string())),
        price: Set(input.price),
        image_url: Set(input.image_url.map(|u| u.to_string())),
        stock: Set(input.stock),
        active: Set(input.active),
        category_id: Set(input.category_id),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Overwrite the stock counter. Callers are responsible for the
/// check-then-act sequence; no row locking happens here.
pub async fn set_stock(db: &DatabaseConnection, id: Uuid, stock: i32) -> Result<Model, errors::ModelError> {
    if stock < 0 { return Err(errors::ModelError::Validation("stock must not be negative".into())); }
    let mut am: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?
        .ok_or_else(|| errors::ModelError::Validation("product not found".into()))?
        .into();
    am.stock = Set(stock);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
