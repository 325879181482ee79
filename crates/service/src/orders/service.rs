//! Order workflows: checkout, status updates and queries.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::cart::domain::ProductSnapshot;
use crate::cart::service as cart_service;
use crate::errors::ServiceError;
use crate::orders::domain::{self, PaymentInfo, ShippingAddress};
use models::order::OrderStatus;
use models::{cart_item, order, order_item, product};

/// API-facing order representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total: Decimal,
    pub ordered_at: chrono::DateTime<chrono::FixedOffset>,
    pub lines: Vec<OrderLineView>,
    pub shipping: ShippingAddress,
    pub payment: PaymentInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineView {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

fn to_view(row: order::Model, items: Vec<order_item::Model>) -> OrderView {
    OrderView {
        id: row.id,
        user_id: row.user_id,
        status: row.status,
        total: row.total,
        ordered_at: row.ordered_at,
        lines: items
            .into_iter()
            .map(|i| OrderLineView {
                product_id: i.product_id,
                quantity: i.quantity,
                unit_price: i.unit_price,
                subtotal: i.subtotal,
            })
            .collect(),
        shipping: ShippingAddress {
            first_name: row.ship_first_name,
            last_name: row.ship_last_name,
            street: row.ship_street,
            city: row.ship_city,
            postal_code: row.ship_postal_code,
            country: row.ship_country,
            phone: row.ship_phone,
            extra: row.ship_extra,
        },
        payment: PaymentInfo {
            method: row.payment_method,
            reference: row.payment_reference,
            paid_at: row.paid_at.map(|t| t.to_utc()),
            status: row.payment_status,
        },
    }
}

async fn load_items(db: &DatabaseConnection, order_id: Uuid) -> Result<Vec<order_item::Model>, ServiceError> {
    order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

async fn find_order(db: &DatabaseConnection, order_id: Uuid) -> Result<order::Model, ServiceError> {
    order::Entity::find_by_id(order_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("order"))
}

/// Checkout: snapshot the cart into an order, decrement stock, empty the
/// cart. Validation happens before the first write.
#[instrument(skip(db, shipping, payment), fields(user_id = %user_id))]
pub async fn place_order(
    db: &DatabaseConnection,
    user_id: Uuid,
    shipping: ShippingAddress,
    payment: PaymentInfo,
) -> Result<OrderView, ServiceError> {
    shipping.validate()?;

    let cart_row = cart_service::find_or_create(db, user_id).await?;
    let items = cart_service::load_items(db, cart_row.id).await?;
    let contents = cart_service::to_contents(&items);

    // Load every referenced product once; stock is checked per line.
    let product_ids: Vec<Uuid> = contents.lines.iter().map(|l| l.product_id).collect();
    let products: HashMap<Uuid, ProductSnapshot> = if product_ids.is_empty() {
        HashMap::new()
    } else {
        product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .iter()
            .map(|p| (p.id, ProductSnapshot::from(p)))
            .collect()
    };

    let draft = domain::build_draft(&contents, &products)?;

    let order_id = Uuid::new_v4();
    let am = order::ActiveModel {
        id: Set(order_id),
        user_id: Set(user_id),
        status: Set(OrderStatus::Pending),
        total: Set(draft.total),
        ordered_at: Set(Utc::now().into()),
        ship_first_name: Set(shipping.first_name.clone()),
        ship_last_name: Set(shipping.last_name.clone()),
        ship_street: Set(shipping.street.clone()),
        ship_city: Set(shipping.city.clone()),
        ship_postal_code: Set(shipping.postal_code.clone()),
        ship_country: Set(shipping.country.clone()),
        ship_phone: Set(shipping.phone.clone()),
        ship_extra: Set(shipping.extra.clone()),
        payment_method: Set(payment.method),
        payment_reference: Set(payment.reference.clone()),
        paid_at: Set(payment.paid_at.map(Into::into)),
        payment_status: Set(payment.status.clone()),
    };
    let created = am.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    for line in &draft.lines {
        let am = order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            subtotal: Set(line.subtotal),
        };
        am.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    }

    // Decrement stock for every ordered line
    for line in &draft.lines {
        let snapshot = &products[&line.product_id];
        models::product::set_stock(db, line.product_id, snapshot.stock - line.quantity).await?;
    }

    // Empty the cart
    cart_item::Entity::delete_many()
        .filter(cart_item::Column::CartId.eq(cart_row.id))
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    models::cart::set_total(db, cart_row.id, Decimal::ZERO).await?;

    info!(order_id = %order_id, total = %draft.total, lines = draft.lines.len(), "order_placed");
    let items = load_items(db, order_id).await?;
    Ok(to_view(created, items))
}

/// Overwrite the order status. Any state is reachable from any other; the
/// only side effect is the stock restore when entering `Cancelled` from a
/// non-cancelled state (so a repeated cancel does not restore twice).
#[instrument(skip(db), fields(order_id = %order_id))]
pub async fn update_status(
    db: &DatabaseConnection,
    order_id: Uuid,
    status: OrderStatus,
) -> Result<OrderView, ServiceError> {
    let row = find_order(db, order_id).await?;
    let previous = row.status;

    if status == OrderStatus::Cancelled && previous != OrderStatus::Cancelled {
        for item in load_items(db, order_id).await? {
            let product_row = product::Entity::find_by_id(item.product_id)
                .one(db)
                .await
                .map_err(|e| ServiceError::Db(e.to_string()))?
                .ok_or_else(|| ServiceError::not_found("product"))?;
            models::product::set_stock(db, item.product_id, product_row.stock + item.quantity).await?;
        }
    }

    let mut am: order::ActiveModel = row.into();
    am.status = Set(status);
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(from = ?previous, to = ?status, "order_status_updated");

    let items = load_items(db, order_id).await?;
    Ok(to_view(updated, items))
}

pub async fn get(db: &DatabaseConnection, order_id: Uuid) -> Result<OrderView, ServiceError> {
    let row = find_order(db, order_id).await?;
    let items = load_items(db, order_id).await?;
    Ok(to_view(row, items))
}

async fn collect_views(db: &DatabaseConnection, rows: Vec<order::Model>) -> Result<Vec<OrderView>, ServiceError> {
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let items = load_items(db, row.id).await?;
        views.push(to_view(row, items));
    }
    Ok(views)
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<OrderView>, ServiceError> {
    let rows = order::Entity::find()
        .order_by_desc(order::Column::OrderedAt)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    collect_views(db, rows).await
}

pub async fn list_by_user(db: &DatabaseConnection, user_id: Uuid) -> Result<Vec<OrderView>, ServiceError> {
    let rows = order::Entity::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::OrderedAt)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    collect_views(db, rows).await
}

pub async fn list_by_status(db: &DatabaseConnection, status: OrderStatus) -> Result<Vec<OrderView>, ServiceError> {
    let rows = order::Entity::find()
        .filter(order::Column::Status.eq(status))
        .order_by_desc(order::Column::OrderedAt)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    collect_views(db, rows).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::service as cart_service;
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
        let email = format!("order_{}@example.com", Uuid::new_v4());
        let buyer = models::user::create(&db, "Order Buyer", &email).await.ok()?;
        let widget = models::product::create(&db, models::product::NewProduct {
            name: "Order Widget",
            description: None,
            price: Decimal::new(500, 2),
            image_url: None,
            stock: 10,
            active: true,
            category_id: None,
        }).await.ok()?;
        Some((db, buyer, widget))
    }

    fn shipping() -> ShippingAddress {
        ShippingAddress {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            street: "1 Analytical Row".into(),
            city: "London".into(),
            postal_code: "N1".into(),
            country: "UK".into(),
            phone: None,
            extra: None,
        }
    }

    fn payment() -> PaymentInfo {
        PaymentInfo {
            method: models::order::PaymentMethod::Card,
            reference: None,
            paid_at: None,
            status: None,
        }
    }

    async fn teardown(db: &DatabaseConnection, buyer: &models::user::Model, widget: &product::Model) {
        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(buyer.id))
            .all(db)
            .await
            .unwrap_or_default();
        for o in orders {
            let _ = order::Entity::delete_by_id(o.id).exec(db).await;
        }
        let _ = models::user::hard_delete(db, buyer.id).await;
        let _ = product::Entity::delete_by_id(widget.id).exec(db).await;
    }

    #[tokio::test]
    async fn empty_cart_checkout_fails_without_side_effects() -> anyhow::Result<()> {
        let Some((db, buyer, widget)) = setup().await else { return Ok(()) };

        let res = place_order(&db, buyer.id, shipping(), payment()).await;
        assert!(matches!(res, Err(ServiceError::EmptyCart)));
        let after = product::Entity::find_by_id(widget.id).one(&db).await?.unwrap();
        assert_eq!(after.stock, 10);

        teardown(&db, &buyer, &widget).await;
        Ok(())
    }

    #[tokio::test]
    async fn checkout_decrements_stock_and_cancellation_restores_it() -> anyhow::Result<()> {
        let Some((db, buyer, widget)) = setup().await else { return Ok(()) };

        cart_service::add_product(&db, buyer.id, widget.id, 3).await?;
        let placed = place_order(&db, buyer.id, shipping(), payment()).await?;
        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(placed.total, Decimal::new(1500, 2));

        // stock decremented by exactly the ordered quantity, cart emptied
        let after = product::Entity::find_by_id(widget.id).one(&db).await?.unwrap();
        assert_eq!(after.stock, 7);
        let cart_view = cart_service::view(&db, buyer.id).await?;
        assert!(cart_view.lines.is_empty());
        assert_eq!(cart_view.total, Decimal::ZERO);

        // price locked at checkout: later price changes do not touch the order
        let own = list_by_user(&db, buyer.id).await?;
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].lines[0].unit_price, Decimal::new(500, 2));

        let cancelled = update_status(&db, placed.id, OrderStatus::Cancelled).await?;
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        let restored = product::Entity::find_by_id(widget.id).one(&db).await?.unwrap();
        assert_eq!(restored.stock, 10);

        // a second cancel must not restore again
        update_status(&db, placed.id, OrderStatus::Cancelled).await?;
        let still = product::Entity::find_by_id(widget.id).one(&db).await?.unwrap();
        assert_eq!(still.stock, 10);

        teardown(&db, &buyer, &widget).await;
        Ok(())
    }

    #[tokio::test]
    async fn status_overwrite_is_unconstrained() -> anyhow::Result<()> {
        let Some((db, buyer, widget)) = setup().await else { return Ok(()) };

        cart_service::add_product(&db, buyer.id, widget.id, 1).await?;
        let placed = place_order(&db, buyer.id, shipping(), payment()).await?;

        // any state is reachable from any other
        update_status(&db, placed.id, OrderStatus::Delivered).await?;
        let back = update_status(&db, placed.id, OrderStatus::Pending).await?;
        assert_eq!(back.status, OrderStatus::Pending);

        teardown(&db, &buyer, &widget).await;
        Ok(())
    }
}
