//! Shopping cart domain model and services.
//!
//! # Architecture
//!
//! Two cart variants share one domain model:
//!
//! - [`OfflineCart`] - anonymous browsing. Lines live in client storage
//!   and every mutation writes through, so state survives restarts.
//! - [`CartService`] - signed-in use. The server owns the cart; every
//!   mutation is an API call followed by a refetch, so concurrent
//!   sessions converge on what the server says.
//!
//! [`CartService::reconcile`] moves an offline cart onto the server at
//! sign-in. The shared [`Cart`] aggregate holds lines plus an optional
//! promo and derives all money values on every read - the discount is
//! recomputed from the current subtotal, never cached, so removing items
//! can never strand a stale flat discount.

use cartwheel_core::{Money, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ApiError;
use crate::api::types::{CartEntry, Product};
use crate::storage::StorageError;

mod offline;
pub mod pricing;
mod service;

pub use offline::OfflineCart;
pub use service::CartService;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The promo code was rejected by the server.
    #[error("invalid promo code: {message}")]
    InvalidPromo {
        /// The server's explanation, e.g. `"Promo code has expired"`.
        message: String,
    },

    /// An API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Persisted cart state could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ============================================================================
// CartLine
// ============================================================================

/// One line of a cart: a product snapshot plus a quantity.
///
/// Invariant: `quantity >= 1`. A line whose quantity would drop to zero
/// is removed, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product this line is for.
    pub product_id: ProductId,
    /// Product title at the time of adding.
    pub title: String,
    /// Unit price at the time of adding.
    pub unit_price: Money,
    /// Product image, if any.
    pub image: Option<String>,
    /// Product category.
    pub category: String,
    /// Quantity, always >= 1.
    pub quantity: u32,
}

impl CartLine {
    /// Build a line from a catalog product.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            title: product.title.clone(),
            unit_price: product.price,
            image: product.image.clone(),
            category: product.category.clone(),
            quantity,
        }
    }

    /// `unit_price x quantity`, decimal-exact.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// A promo code that passed server validation.
///
/// Only the *percentage* is stored. The discount amount is derived from
/// the current subtotal on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedPromo {
    /// The code as entered.
    pub code: String,
    /// Validated discount percentage (e.g. 10 for 10%).
    pub percentage: Decimal,
}

// ============================================================================
// Cart
// ============================================================================

/// The cart aggregate: lines plus an optional applied promo.
///
/// All money values are derived on read via [`pricing`]; nothing is
/// cached, so every accessor reflects the current lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
    promo: Option<AppliedPromo>,
}

impl Cart {
    /// An empty cart with no promo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from server cart entries.
    #[must_use]
    pub fn from_entries(entries: &[CartEntry]) -> Self {
        let lines = entries
            .iter()
            .map(|entry| CartLine::from_product(&entry.product, entry.quantity))
            .collect();
        Self { lines, promo: None }
    }

    /// The cart lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The applied promo, if any.
    #[must_use]
    pub fn promo(&self) -> Option<&AppliedPromo> {
        self.promo.as_ref()
    }

    /// True when the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of `unit_price x quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        pricing::subtotal(&self.lines)
    }

    /// Discount derived from the applied promo and the *current*
    /// subtotal. Zero when no promo is applied.
    #[must_use]
    pub fn discount(&self) -> Money {
        self.promo
            .as_ref()
            .map_or(Money::ZERO, |promo| {
                pricing::discount(self.subtotal(), promo.percentage)
            })
    }

    /// Grand total: subtotal minus discount, clamped at zero.
    #[must_use]
    pub fn total(&self) -> Money {
        pricing::total(self.subtotal(), self.discount())
    }

    /// Total number of items (sum of quantities).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        pricing::item_count(&self.lines)
    }

    /// Add a product. Merges into the existing line when the product is
    /// already in the cart. Adding zero of something is a no-op.
    pub fn add_line(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine::from_product(product, quantity)),
        }
    }

    /// Set the quantity of a line. A quantity of zero is a no-op - the
    /// line keeps its prior quantity. Deleting goes through
    /// [`Cart::remove_line`] only.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        }
    }

    /// Remove a line. Removing an absent product is a no-op.
    pub fn remove_line(&mut self, product_id: ProductId) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    /// Empty the cart and drop any applied promo.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.promo = None;
    }

    /// Attach or detach a promo. Callers are expected to validate codes
    /// against the promo endpoint first; see [`CartService::apply_promo`].
    pub fn set_promo(&mut self, promo: Option<AppliedPromo>) {
        self.promo = promo;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product(id: i64, title: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            price: Money::from_cents(cents),
            description: String::new(),
            category: "test".to_string(),
            image: None,
            rating_rate: None,
            rating_count: None,
        }
    }

    #[test]
    fn test_adding_same_product_twice_merges() {
        let mut cart = Cart::new();
        let shirt = product(1, "Red Shirt", 20_00);

        cart.add_line(&shirt, 1);
        cart.add_line(&shirt, 1);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_update_quantity_zero_is_noop() {
        let mut cart = Cart::new();
        cart.add_line(&product(1, "Red Shirt", 20_00), 3);

        cart.update_quantity(ProductId::new(1), 0);
        assert_eq!(cart.lines()[0].quantity, 3);

        cart.update_quantity(ProductId::new(1), 5);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_remove_line_always_deletes() {
        let mut cart = Cart::new();
        cart.add_line(&product(1, "Red Shirt", 20_00), 3);

        cart.remove_line(ProductId::new(1));
        assert!(cart.is_empty());

        // Removing again is harmless
        cart.remove_line(ProductId::new(1));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_discount_recomputes_after_line_removal() {
        let mut cart = Cart::new();
        cart.add_line(&product(1, "Red Shirt", 20_00), 2); // 40.00
        cart.add_line(&product(2, "Blue Hat", 15_00), 4); // 60.00
        cart.set_promo(Some(AppliedPromo {
            code: "SAVE10".to_string(),
            percentage: Decimal::from(10),
        }));

        assert_eq!(cart.subtotal(), Money::from_cents(100_00));
        assert_eq!(cart.discount(), Money::from_cents(10_00));
        assert_eq!(cart.total(), Money::from_cents(90_00));

        // Dropping a line re-derives the discount from the new subtotal
        cart.remove_line(ProductId::new(2));
        assert_eq!(cart.subtotal(), Money::from_cents(40_00));
        assert_eq!(cart.discount(), Money::from_cents(4_00));
        assert_eq!(cart.total(), Money::from_cents(36_00));
    }

    #[test]
    fn test_clear_drops_lines_and_promo() {
        let mut cart = Cart::new();
        cart.add_line(&product(1, "Red Shirt", 20_00), 1);
        cart.set_promo(Some(AppliedPromo {
            code: "SAVE10".to_string(),
            percentage: Decimal::from(10),
        }));

        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.promo().is_none());
        assert_eq!(cart.total(), Money::ZERO);
    }

    #[test]
    fn test_from_entries_maps_products() {
        let entries = vec![CartEntry {
            id: cartwheel_core::CartEntryId::new(9),
            product: product(1, "Red Shirt", 20_00),
            quantity: 2,
            added_at: chrono::NaiveDate::from_ymd_opt(2026, 1, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            updated_at: None,
        }];

        let cart = Cart::from_entries(&entries);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].title, "Red Shirt");
        assert_eq!(cart.subtotal(), Money::from_cents(40_00));
    }
}
