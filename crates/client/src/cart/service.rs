//! Server-authoritative cart for signed-in accounts.

use cartwheel_core::ProductId;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::storage::{SharedStorage, keys};

use super::{AppliedPromo, Cart, CartError, OfflineCart};

/// Cart operations backed by the server.
///
/// The server owns the cart: every mutation is an API call followed by
/// a refetch, so concurrent sessions converge on the server's state.
/// Only the applied promo is client-side (persisted in storage) - the
/// server validates codes but does not store which one a cart uses.
#[derive(Debug)]
pub struct CartService {
    api: ApiClient,
    storage: SharedStorage,
}

impl CartService {
    /// Create a cart service over an API client and the storage that
    /// holds the persisted promo.
    #[must_use]
    pub fn new(api: ApiClient, storage: SharedStorage) -> Self {
        Self { api, storage }
    }

    /// Fetch the current cart from the server and attach the locally
    /// persisted promo, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Api`] wrapping `AuthRequired` when not
    /// signed in, or another error if the fetch fails.
    pub async fn fetch(&self) -> Result<Cart, CartError> {
        let entries = self.api.cart().await?;
        let mut cart = Cart::from_entries(&entries);
        cart.set_promo(self.persisted_promo()?);
        Ok(cart)
    }

    /// Add a product, merging quantities server-side when it is already
    /// in the cart. Returns the refetched cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call or the refetch fails.
    pub async fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        let mutation = self.api.add_to_cart(product_id, quantity).await?;
        debug!(%product_id, count = mutation.cart_item_count, "{}", mutation.message);
        self.fetch().await
    }

    /// Set the quantity of a cart line. A quantity of zero is a no-op
    /// returning the unchanged cart; deleting goes through
    /// [`CartService::remove_item`] only.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call or the refetch fails.
    pub async fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            debug!(%product_id, "ignoring zero-quantity update");
            return self.fetch().await;
        }
        let mutation = self.api.update_cart_item(product_id, quantity).await?;
        debug!(%product_id, count = mutation.cart_item_count, "{}", mutation.message);
        self.fetch().await
    }

    /// Remove a product from the cart. Returns the refetched cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call or the refetch fails.
    pub async fn remove_item(&mut self, product_id: ProductId) -> Result<Cart, CartError> {
        let mutation = self.api.remove_from_cart(product_id).await?;
        debug!(%product_id, count = mutation.cart_item_count, "{}", mutation.message);
        self.fetch().await
    }

    /// Empty the cart on the server and drop the persisted promo.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails; the persisted promo is
    /// only dropped after the server confirms.
    pub async fn clear(&mut self) -> Result<(), CartError> {
        let mutation = self.api.clear_cart().await?;
        debug!("{}", mutation.message);
        self.storage.remove(keys::PROMO)?;
        Ok(())
    }

    /// Validate a promo code against the server and persist it on
    /// success.
    ///
    /// A rejected code returns [`CartError::InvalidPromo`] with the
    /// server's explanation and leaves any previously applied promo
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidPromo`] for rejected codes, or
    /// [`CartError::Api`] if the validation call itself fails.
    pub async fn apply_promo(&mut self, code: &str) -> Result<AppliedPromo, CartError> {
        let validation = self.api.validate_promo(code).await?;

        if !validation.valid {
            let message = validation
                .message
                .unwrap_or_else(|| "Invalid promo code".to_string());
            debug!(%code, %message, "promo rejected");
            return Err(CartError::InvalidPromo { message });
        }

        let promo = AppliedPromo {
            code: code.to_string(),
            percentage: validation.discount_percentage.unwrap_or(Decimal::ZERO),
        };

        let json = serde_json::to_string(&promo).map_err(crate::storage::StorageError::from)?;
        self.storage.set(keys::PROMO, &json)?;
        info!(code = %promo.code, percentage = %promo.percentage, "promo applied");
        Ok(promo)
    }

    /// Drop the applied promo, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted promo cannot be removed.
    pub fn remove_promo(&mut self) -> Result<(), CartError> {
        self.storage.remove(keys::PROMO)?;
        Ok(())
    }

    /// Total item count. Anonymous callers get 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn item_count(&self) -> Result<u32, CartError> {
        Ok(self.api.cart_count().await?)
    }

    /// Push an offline cart onto the server after sign-in.
    ///
    /// Each offline line is added via the add endpoint (the server
    /// merges quantities with whatever is already there) and removed
    /// from the offline store as it lands, so a failure partway leaves
    /// only the unpushed lines behind. Any offline promo stays persisted
    /// under the shared key and carries over. Returns the refetched
    /// server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if an add call or the final refetch fails.
    pub async fn reconcile(&mut self, offline: &mut OfflineCart) -> Result<Cart, CartError> {
        let pending = offline.cart().lines().len();
        if pending > 0 {
            info!(lines = pending, "reconciling offline cart onto server");
        }

        while let Some(line) = offline.cart().lines().first().cloned() {
            self.api.add_to_cart(line.product_id, line.quantity).await?;
            offline.remove_line(line.product_id)?;
        }

        self.fetch().await
    }

    /// The locally persisted promo, if one is stored and readable.
    fn persisted_promo(&self) -> Result<Option<AppliedPromo>, CartError> {
        let Some(json) = self.storage.get(keys::PROMO)? else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(promo) => Ok(Some(promo)),
            Err(error) => {
                warn!(%error, "stored promo is unreadable, dropping it");
                Ok(None)
            }
        }
    }
}
