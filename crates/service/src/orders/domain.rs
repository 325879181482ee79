//! Checkout arithmetic: turn cart contents into an immutable order draft.
//!
//! Stock is validated here for every line before any write happens, so a
//! failed checkout leaves no partial stock mutation. The check is not a
//! reservation; two concurrent checkouts can still race on the same
//! product (documented gap of the system).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::domain::{CartContents, ProductSnapshot};
use crate::errors::ServiceError;
use models::order::PaymentMethod;

/// Shipping address captured on the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub extra: Option<String>,
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), ServiceError> {
        let required = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("street", &self.street),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ServiceError::Validation(format!("shipping {} required", field)));
            }
        }
        Ok(())
    }
}

/// Payment details captured on the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One immutable order line: price locked from the cart snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// A validated order, not yet persisted.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
}

/// Build the draft from the cart, checking stock for every line.
pub fn build_draft(
    cart: &CartContents,
    products: &HashMap<Uuid, ProductSnapshot>,
) -> Result<OrderDraft, ServiceError> {
    if cart.is_empty() {
        return Err(ServiceError::EmptyCart);
    }

    for line in &cart.lines {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| ServiceError::not_found("product"))?;
        if product.stock < line.quantity {
            return Err(ServiceError::InsufficientStock(product.name.clone()));
        }
    }

    let lines: Vec<OrderLine> = cart
        .lines
        .iter()
        .map(|l| OrderLine {
            product_id: l.product_id,
            quantity: l.quantity,
            unit_price: l.unit_price,
            subtotal: l.subtotal,
        })
        .collect();
    let total = lines.iter().map(|l| l.subtotal).sum();
    Ok(OrderDraft { lines, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::domain::CartContents;

    fn snapshot(stock: i32, price_cents: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: Uuid::new_v4(),
            name: "Widget".into(),
            price: Decimal::new(price_cents, 2),
            stock,
        }
    }

    #[test]
    fn empty_cart_is_rejected() {
        let cart = CartContents::default();
        let res = build_draft(&cart, &HashMap::new());
        assert!(matches!(res, Err(ServiceError::EmptyCart)));
    }

    #[test]
    fn draft_copies_lines_and_total() {
        let a = snapshot(10, 500);
        let b = snapshot(4, 1250);
        let mut cart = CartContents::default();
        cart.add(&a, 2).unwrap();
        cart.add(&b, 1).unwrap();

        let products: HashMap<Uuid, ProductSnapshot> =
            [(a.id, a.clone()), (b.id, b.clone())].into_iter().collect();
        let draft = build_draft(&cart, &products).unwrap();
        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.total, Decimal::new(2250, 2));
        assert_eq!(draft.total, cart.total);
    }

    #[test]
    fn stock_shortage_at_checkout_is_rejected() {
        let a = snapshot(5, 500);
        let mut cart = CartContents::default();
        cart.add(&a, 5).unwrap();

        // stock dropped between add and checkout
        let mut depleted = a.clone();
        depleted.stock = 3;
        let products: HashMap<Uuid, ProductSnapshot> = [(a.id, depleted)].into_iter().collect();
        let res = build_draft(&cart, &products);
        assert!(matches!(res, Err(ServiceError::InsufficientStock(_))));
    }

    #[test]
    fn draft_keeps_cart_price_snapshot() {
        let a = snapshot(10, 500);
        let mut cart = CartContents::default();
        cart.add(&a, 1).unwrap();

        // price raised after the product went into the cart
        let mut repriced = a.clone();
        repriced.price = Decimal::new(999, 2);
        let products: HashMap<Uuid, ProductSnapshot> = [(a.id, repriced)].into_iter().collect();
        let draft = build_draft(&cart, &products).unwrap();
        assert_eq!(draft.lines[0].unit_price, Decimal::new(500, 2));
    }

    #[test]
    fn address_validation_requires_core_fields() {
        let address = ShippingAddress {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            street: "".into(),
            city: "London".into(),
            postal_code: "N1".into(),
            country: "UK".into(),
            phone: None,
            extra: None,
        };
        assert!(address.validate().is_err());
    }
}
