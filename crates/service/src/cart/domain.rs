//! In-memory cart aggregate.
//!
//! All mutations re-establish the invariant `total == sum(line subtotals)`
//! by a full recomputation; carts are small, so O(n) per mutation is fine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// The slice of a product the cart logic needs.
#[derive(Debug, Clone)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
}

impl From<&models::product::Model> for ProductSnapshot {
    fn from(p: &models::product::Model) -> Self {
        Self { id: p.id, name: p.name.clone(), price: p.price, stock: p.stock }
    }
}

/// One pending purchase line. `unit_price` is the product price snapshot
/// taken when the line was first added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Mutable cart contents, detached from storage.
#[derive(Debug, Clone, Default)]
pub struct CartContents {
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

impl CartContents {
    pub fn new(lines: Vec<CartLine>) -> Self {
        let mut contents = Self { lines, total: Decimal::ZERO };
        contents.recompute_total();
        contents
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add `quantity` of a product. An existing line is incremented, a new
    /// product gets a fresh line with the current price as snapshot. The
    /// cumulative quantity must not exceed the current stock.
    pub fn add(&mut self, product: &ProductSnapshot, quantity: i32) -> Result<(), ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::Validation("quantity must be positive".into()));
        }
        let current = self
            .lines
            .iter()
            .find(|l| l.product_id == product.id)
            .map(|l| l.quantity)
            .unwrap_or(0);
        let cumulative = current + quantity;
        if cumulative > product.stock {
            return Err(ServiceError::InsufficientStock(product.name.clone()));
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = cumulative;
            line.subtotal = line.unit_price * Decimal::from(cumulative);
        } else {
            self.lines.push(CartLine {
                product_id: product.id,
                quantity,
                unit_price: product.price,
                subtotal: product.price * Decimal::from(quantity),
            });
        }
        self.recompute_total();
        Ok(())
    }

    /// Overwrite the quantity of an existing line. A product that is not in
    /// the cart is left untouched.
    pub fn set_quantity(&mut self, product: &ProductSnapshot, quantity: i32) -> Result<(), ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::Validation("quantity must be positive".into()));
        }
        if quantity > product.stock {
            return Err(ServiceError::InsufficientStock(product.name.clone()));
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = quantity;
            line.subtotal = line.unit_price * Decimal::from(quantity);
            self.recompute_total();
        }
        Ok(())
    }

    pub fn remove(&mut self, product_id: Uuid) {
        self.lines.retain(|l| l.product_id != product_id);
        self.recompute_total();
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.total = Decimal::ZERO;
    }

    fn recompute_total(&mut self) {
        self.total = self.lines.iter().map(|l| l.subtotal).sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(stock: i32, price_cents: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: Uuid::new_v4(),
            name: "Widget".into(),
            price: Decimal::new(price_cents, 2),
            stock,
        }
    }

    #[test]
    fn add_then_increment_then_reject_over_stock() {
        // stock 10, price 5.00: add 3 -> 15.00; add 4 -> 35.00; set 20 -> rejected
        let product = widget(10, 500);
        let mut cart = CartContents::default();

        cart.add(&product, 3).unwrap();
        assert_eq!(cart.total, Decimal::new(1500, 2));

        cart.add(&product, 4).unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 7);
        assert_eq!(cart.total, Decimal::new(3500, 2));

        let res = cart.set_quantity(&product, 20);
        assert!(matches!(res, Err(ServiceError::InsufficientStock(_))));
        assert_eq!(cart.total, Decimal::new(3500, 2));
    }

    #[test]
    fn cumulative_add_cannot_exceed_stock() {
        let product = widget(5, 100);
        let mut cart = CartContents::default();
        cart.add(&product, 3).unwrap();
        assert!(matches!(cart.add(&product, 3), Err(ServiceError::InsufficientStock(_))));
        assert_eq!(cart.lines[0].quantity, 3);
    }

    #[test]
    fn total_tracks_sum_of_subtotals_across_mutations() {
        let a = widget(10, 500);
        let b = widget(10, 250);
        let mut cart = CartContents::default();

        cart.add(&a, 2).unwrap();
        cart.add(&b, 4).unwrap();
        cart.set_quantity(&b, 1).unwrap();
        cart.remove(a.id);
        cart.add(&a, 1).unwrap();

        let expected: Decimal = cart.lines.iter().map(|l| l.subtotal).sum();
        assert_eq!(cart.total, expected);
        assert_eq!(cart.total, Decimal::new(750, 2));
    }

    #[test]
    fn set_quantity_rejects_non_positive() {
        let product = widget(10, 500);
        let mut cart = CartContents::default();
        cart.add(&product, 1).unwrap();
        assert!(cart.set_quantity(&product, 0).is_err());
        assert!(cart.add(&product, -2).is_err());
    }

    #[test]
    fn set_quantity_on_absent_product_is_a_noop() {
        let in_cart = widget(10, 500);
        let absent = widget(10, 300);
        let mut cart = CartContents::default();
        cart.add(&in_cart, 2).unwrap();
        cart.set_quantity(&absent, 3).unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.total, Decimal::new(1000, 2));
    }

    #[test]
    fn unit_price_is_snapshotted_at_add_time() {
        let mut product = widget(10, 500);
        let mut cart = CartContents::default();
        cart.add(&product, 1).unwrap();

        // a later price change must not affect the existing line
        product.price = Decimal::new(900, 2);
        cart.add(&product, 1).unwrap();
        assert_eq!(cart.lines[0].unit_price, Decimal::new(500, 2));
        assert_eq!(cart.total, Decimal::new(1000, 2));
    }

    #[test]
    fn clear_resets_everything() {
        let product = widget(10, 500);
        let mut cart = CartContents::default();
        cart.add(&product, 2).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);
    }
}
