//! Cart persistence: load the aggregate, mutate it in memory, reconcile the
//! rows. One cart per user, created on first access.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::cart::domain::{CartContents, CartLine, ProductSnapshot};
use crate::errors::ServiceError;
use models::{cart, cart_item, product};

/// API-facing cart representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lines: Vec<CartLineView>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineView {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

pub(crate) async fn find_or_create(db: &DatabaseConnection, user_id: Uuid) -> Result<cart::Model, ServiceError> {
    match cart::find_by_user(db, user_id).await? {
        Some(found) => Ok(found),
        None => Ok(cart::create_for_user(db, user_id).await?),
    }
}

pub(crate) async fn load_items(db: &DatabaseConnection, cart_id: Uuid) -> Result<Vec<cart_item::Model>, ServiceError> {
    cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

pub(crate) fn to_contents(items: &[cart_item::Model]) -> CartContents {
    CartContents::new(
        items
            .iter()
            .map(|i| CartLine {
                product_id: i.product_id,
                quantity: i.quantity,
                unit_price: i.unit_price,
                subtotal: i.subtotal,
            })
            .collect(),
    )
}

async fn get_product(db: &DatabaseConnection, product_id: Uuid) -> Result<product::Model, ServiceError> {
    product::Entity::find_by_id(product_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("product"))
}

/// Write the mutated contents back: update changed lines, insert new ones,
/// drop removed ones, then store the recomputed total.
async fn persist(
    db: &DatabaseConnection,
    cart_row: &cart::Model,
    existing: Vec<cart_item::Model>,
    contents: &CartContents,
) -> Result<(), ServiceError> {
    let mut by_product: HashMap<Uuid, cart_item::Model> =
        existing.into_iter().map(|i| (i.product_id, i)).collect();

    for line in &contents.lines {
        match by_product.remove(&line.product_id) {
            Some(row) => {
                if row.quantity != line.quantity || row.subtotal != line.subtotal {
                    let mut am: cart_item::ActiveModel = row.into();
                    am.quantity = Set(line.quantity);
                    am.subtotal = Set(line.subtotal);
                    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
                }
            }
            None => {
                let am = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart_row.id),
                    product_id: Set(line.product_id),
                    quantity: Set(line.quantity),
                    unit_price: Set(line.unit_price),
                    subtotal: Set(line.subtotal),
                };
                am.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
            }
        }
    }

    for leftover in by_product.into_values() {
        cart_item::Entity::delete_by_id(leftover.id)
            .exec(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
    }

    cart::set_total(db, cart_row.id, contents.total).await?;
    Ok(())
}

async fn build_view(db: &DatabaseConnection, cart_row: &cart::Model) -> Result<CartView, ServiceError> {
    let items = load_items(db, cart_row.id).await?;
    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let names: HashMap<Uuid, String> = if product_ids.is_empty() {
        HashMap::new()
    } else {
        product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect()
    };
    // Refresh the total from the rows in case the cart row is stale
    let total = items.iter().map(|i| i.subtotal).sum();
    Ok(CartView {
        id: cart_row.id,
        user_id: cart_row.user_id,
        lines: items
            .into_iter()
            .map(|i| CartLineView {
                product_id: i.product_id,
                product_name: names.get(&i.product_id).cloned().unwrap_or_default(),
                quantity: i.quantity,
                unit_price: i.unit_price,
                subtotal: i.subtotal,
            })
            .collect(),
        total,
    })
}

/// Current cart of a user, created lazily.
pub async fn view(db: &DatabaseConnection, user_id: Uuid) -> Result<CartView, ServiceError> {
    let cart_row = find_or_create(db, user_id).await?;
    build_view(db, &cart_row).await
}

#[instrument(skip(db), fields(user_id = %user_id, product_id = %product_id))]
pub async fn add_product(
    db: &DatabaseConnection,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<CartView, ServiceError> {
    let cart_row = find_or_create(db, user_id).await?;
    let product_row = get_product(db, product_id).await?;
    let items = load_items(db, cart_row.id).await?;

    let mut contents = to_contents(&items);
    contents.add(&ProductSnapshot::from(&product_row), quantity)?;
    persist(db, &cart_row, items, &contents).await?;
    info!(cart_id = %cart_row.id, total = %contents.total, "cart_product_added");
    build_view(db, &cart_row).await
}

#[instrument(skip(db), fields(user_id = %user_id, product_id = %product_id))]
pub async fn update_quantity(
    db: &DatabaseConnection,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<CartView, ServiceError> {
    let cart_row = find_or_create(db, user_id).await?;
    let product_row = get_product(db, product_id).await?;
    let items = load_items(db, cart_row.id).await?;

    let mut contents = to_contents(&items);
    contents.set_quantity(&ProductSnapshot::from(&product_row), quantity)?;
    persist(db, &cart_row, items, &contents).await?;
    build_view(db, &cart_row).await
}

pub async fn remove_product(
    db: &DatabaseConnection,
    user_id: Uuid,
    product_id: Uuid,
) -> Result<CartView, ServiceError> {
    let cart_row = find_or_create(db, user_id).await?;
    let items = load_items(db, cart_row.id).await?;

    let mut contents = to_contents(&items);
    contents.remove(product_id);
    persist(db, &cart_row, items, &contents).await?;
    build_view(db, &cart_row).await
}

pub async fn clear(db: &DatabaseConnection, user_id: Uuid) -> Result<CartView, ServiceError> {
    let cart_row = find_or_create(db, user_id).await?;
    cart_item::Entity::delete_many()
        .filter(cart_item::Column::CartId.eq(cart_row.id))
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    cart::set_total(db, cart_row.id, Decimal::ZERO).await?;
    build_view(db, &cart_row).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::MigratorTrait;

    async fn setup() -> Option<(DatabaseConnection, models::user::Model, product::Model)> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return None;
        }
        let db = match models::db::connect().await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("skip: cannot connect to db: {}", e);
                return None;
            }
        };
        if let Err(e) = migration::Migrator::up(&db, None).await {
            eprintln!("skip: migrate up failed: {}", e);
            return None;
        }
        let email = format!("cart_{}@example.com", Uuid::new_v4());
        let buyer = models::user::create(&db, "Cart Buyer", &email).await.ok()?;
        let widget = models::product::create(&db, models::product::NewProduct {
            name: "Cart Widget",
            description: None,
            price: Decimal::new(500, 2),
            image_url: None,
            stock: 10,
            active: true,
            category_id: None,
        }).await.ok()?;
        Some((db, buyer, widget))
    }

    async fn teardown(db: &DatabaseConnection, buyer: &models::user::Model, widget: &product::Model) {
        let _ = models::user::hard_delete(db, buyer.id).await;
        let _ = product::Entity::delete_by_id(widget.id).exec(db).await;
    }

    #[tokio::test]
    async fn cart_mutations_keep_total_consistent() -> anyhow::Result<()> {
        let Some((db, buyer, widget)) = setup().await else { return Ok(()) };

        let view = add_product(&db, buyer.id, widget.id, 3).await?;
        assert_eq!(view.total, Decimal::new(1500, 2));
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].product_name, "Cart Widget");

        let view = add_product(&db, buyer.id, widget.id, 4).await?;
        assert_eq!(view.total, Decimal::new(3500, 2));
        assert_eq!(view.lines[0].quantity, 7);

        let res = update_quantity(&db, buyer.id, widget.id, 20).await;
        assert!(matches!(res, Err(ServiceError::InsufficientStock(_))));

        let view = update_quantity(&db, buyer.id, widget.id, 2).await?;
        assert_eq!(view.total, Decimal::new(1000, 2));

        let view = remove_product(&db, buyer.id, widget.id).await?;
        assert!(view.lines.is_empty());
        assert_eq!(view.total, Decimal::ZERO);

        teardown(&db, &buyer, &widget).await;
        Ok(())
    }

    #[tokio::test]
    async fn clear_empties_the_cart() -> anyhow::Result<()> {
        let Some((db, buyer, widget)) = setup().await else { return Ok(()) };

        add_product(&db, buyer.id, widget.id, 2).await?;
        let view = clear(&db, buyer.id).await?;
        assert!(view.lines.is_empty());
        assert_eq!(view.total, Decimal::ZERO);

        teardown(&db, &buyer, &widget).await;
        Ok(())
    }
}
