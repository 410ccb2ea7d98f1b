//! Offline cart for anonymous browsing.
//!
//! Lines and any applied promo live in client storage and every
//! mutation writes through, so the cart survives restarts. On sign-in,
//! [`CartService::reconcile`](super::CartService::reconcile) pushes the
//! contents to the server and empties this store.

use cartwheel_core::ProductId;
use tracing::{debug, warn};

use crate::api::types::Product;
use crate::storage::{SharedStorage, StorageError, keys};

use super::{AppliedPromo, Cart, CartLine};

/// A cart persisted in client storage, for use while signed out.
#[derive(Debug)]
pub struct OfflineCart {
    storage: SharedStorage,
    cart: Cart,
}

impl OfflineCart {
    /// Load the persisted cart, or start empty when nothing is stored.
    ///
    /// Unreadable stored state (e.g. a corrupt file edited by hand) is
    /// logged and treated as empty rather than failing the whole client.
    ///
    /// # Errors
    ///
    /// Returns an error if storage itself cannot be read.
    pub fn load(storage: SharedStorage) -> Result<Self, StorageError> {
        let lines: Vec<CartLine> = match storage.get(keys::CART)? {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|error| {
                warn!(%error, "stored cart is unreadable, starting empty");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let promo: Option<AppliedPromo> = match storage.get(keys::PROMO)? {
            Some(json) => serde_json::from_str(&json).map_or_else(
                |error| {
                    warn!(%error, "stored promo is unreadable, dropping it");
                    None
                },
                Some,
            ),
            None => None,
        };

        let mut cart = Cart::new();
        for line in lines {
            // Re-use the aggregate's merge logic so a hand-edited file
            // with duplicate lines collapses back to the invariant.
            let product = Product {
                id: line.product_id,
                title: line.title.clone(),
                price: line.unit_price,
                description: String::new(),
                category: line.category.clone(),
                image: line.image.clone(),
                rating_rate: None,
                rating_count: None,
            };
            cart.add_line(&product, line.quantity);
        }
        cart.set_promo(promo);

        Ok(Self { storage, cart })
    }

    /// The current cart state.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add a product, merging quantities when it is already present.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub fn add_line(&mut self, product: &Product, quantity: u32) -> Result<(), StorageError> {
        self.cart.add_line(product, quantity);
        self.persist()
    }

    /// Set the quantity of a line. A quantity of zero is a no-op; lines
    /// are only deleted via [`OfflineCart::remove_line`].
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), StorageError> {
        if quantity == 0 {
            debug!(%product_id, "ignoring zero-quantity update");
            return Ok(());
        }
        self.cart.update_quantity(product_id, quantity);
        self.persist()
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub fn remove_line(&mut self, product_id: ProductId) -> Result<(), StorageError> {
        self.cart.remove_line(product_id);
        self.persist()
    }

    /// Empty the cart and drop any promo.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.cart.clear();
        self.storage.remove(keys::CART)?;
        self.storage.remove(keys::PROMO)?;
        Ok(())
    }

    /// Attach a promo that already passed server validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub fn apply_promo(&mut self, promo: AppliedPromo) -> Result<(), StorageError> {
        self.cart.set_promo(Some(promo));
        self.persist()
    }

    /// Detach the applied promo, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub fn clear_promo(&mut self) -> Result<(), StorageError> {
        self.cart.set_promo(None);
        self.persist()
    }

    /// Write the full cart state through to storage.
    fn persist(&self) -> Result<(), StorageError> {
        let lines = serde_json::to_string(self.cart.lines())?;
        self.storage.set(keys::CART, &lines)?;

        match self.cart.promo() {
            Some(promo) => {
                let json = serde_json::to_string(promo)?;
                self.storage.set(keys::PROMO, &json)?;
            }
            None => self.storage.remove(keys::PROMO)?,
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use cartwheel_core::Money;
    use rust_decimal::Decimal;

    fn product(id: i64, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Money::from_cents(cents),
            description: String::new(),
            category: "test".to_string(),
            image: None,
            rating_rate: None,
            rating_count: None,
        }
    }

    #[test]
    fn test_cart_survives_reload() {
        let storage = MemoryStorage::shared();

        let mut cart = OfflineCart::load(storage.clone()).unwrap();
        cart.add_line(&product(1, 20_00), 2).unwrap();
        cart.apply_promo(AppliedPromo {
            code: "SAVE10".to_string(),
            percentage: Decimal::from(10),
        })
        .unwrap();

        let reloaded = OfflineCart::load(storage).unwrap();
        assert_eq!(reloaded.cart().item_count(), 2);
        assert_eq!(reloaded.cart().promo().unwrap().code, "SAVE10");
        assert_eq!(reloaded.cart().total(), Money::from_cents(36_00));
    }

    #[test]
    fn test_zero_quantity_update_is_noop() {
        let storage = MemoryStorage::shared();
        let mut cart = OfflineCart::load(storage.clone()).unwrap();
        cart.add_line(&product(1, 20_00), 3).unwrap();

        cart.update_quantity(ProductId::new(1), 0).unwrap();

        let reloaded = OfflineCart::load(storage).unwrap();
        assert_eq!(reloaded.cart().lines()[0].quantity, 3);
    }

    #[test]
    fn test_clear_removes_persisted_keys() {
        let storage = MemoryStorage::shared();
        let mut cart = OfflineCart::load(storage.clone()).unwrap();
        cart.add_line(&product(1, 20_00), 1).unwrap();
        cart.apply_promo(AppliedPromo {
            code: "SAVE10".to_string(),
            percentage: Decimal::from(10),
        })
        .unwrap();

        cart.clear().unwrap();

        assert!(storage.get(keys::CART).unwrap().is_none());
        assert!(storage.get(keys::PROMO).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_stored_cart_starts_empty() {
        let storage = MemoryStorage::shared();
        storage.set(keys::CART, "not json").unwrap();

        let cart = OfflineCart::load(storage).unwrap();
        assert!(cart.cart().is_empty());
    }

    #[test]
    fn test_load_merges_duplicate_stored_lines() {
        let storage = MemoryStorage::shared();
        let line = CartLine::from_product(&product(1, 20_00), 1);
        let json = serde_json::to_string(&vec![line.clone(), line]).unwrap();
        storage.set(keys::CART, &json).unwrap();

        let cart = OfflineCart::load(storage).unwrap();
        assert_eq!(cart.cart().lines().len(), 1);
        assert_eq!(cart.cart().lines()[0].quantity, 2);
    }
}
