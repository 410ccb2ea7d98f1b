//! Checkout: address validation, order assembly and submission.
//!
//! The flow is strictly ordered so nothing mutates on failure: reject an
//! empty cart, validate the address, assemble the payload, submit. Only
//! after the server confirms the order does the cart get cleared.

use thiserror::Error;
use tracing::{info, warn};

use crate::api::types::{Order, OrderItemRequest, OrderRequest};
use crate::api::{ApiClient, ApiError};
use crate::cart::{Cart, CartService};

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout was attempted with an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// A mandatory address field is blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Order submission failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A delivery address. Every field is mandatory; validity is "non-blank
/// after trimming" - no format validation beyond that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Recipient name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Street address.
    pub street: String,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
    /// Country.
    pub country: String,
}

impl Address {
    /// Check that every field is non-blank, reporting the first blank
    /// one by its payload name.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingField`] naming the first blank
    /// field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        for (name, value) in self.fields() {
            if value.trim().is_empty() {
                return Err(CheckoutError::MissingField(name));
            }
        }
        Ok(())
    }

    fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("fullName", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
            ("country", &self.country),
        ]
    }
}

/// Assemble the order payload from a cart and an address.
///
/// Totals are rounded to cents here - the one submission-time rounding
/// point - while line prices are carried verbatim.
#[must_use]
pub fn build_order_request(cart: &Cart, address: &Address) -> OrderRequest {
    let items = cart
        .lines()
        .iter()
        .map(|line| OrderItemRequest {
            product_id: line.product_id,
            quantity: line.quantity,
            price: line.unit_price,
        })
        .collect();

    OrderRequest {
        total_amount: cart.total().round_to_cents(),
        discount_amount: cart.discount().round_to_cents(),
        promo_code: cart.promo().map(|promo| promo.code.clone()),
        items,
        full_name: address.full_name.clone(),
        email: address.email.clone(),
        phone: address.phone.clone(),
        street: address.street.clone(),
        city: address.city.clone(),
        state: address.state.clone(),
        zip_code: address.zip_code.clone(),
        country: address.country.clone(),
    }
}

/// Runs the checkout flow against the server.
#[derive(Debug)]
pub struct CheckoutService {
    api: ApiClient,
    cart: CartService,
}

impl CheckoutService {
    /// Create a checkout service.
    #[must_use]
    pub fn new(api: ApiClient, cart: CartService) -> Self {
        Self { api, cart }
    }

    /// Place an order for the given cart, delivered to `address`.
    ///
    /// Validation failures are returned before any network call. On
    /// success the server cart and the persisted promo are cleared and
    /// the created order (the confirmation snapshot) is returned; on any
    /// failure the cart and promo are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] or
    /// [`CheckoutError::MissingField`] from validation, or
    /// [`CheckoutError::Api`] if submission fails.
    pub async fn place_order(
        &mut self,
        cart: &Cart,
        address: &Address,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        address.validate()?;

        let request = build_order_request(cart, address);
        let order = self.api.place_order(&request).await?;
        info!(order_id = %order.id, total = %order.total_amount, "order placed");

        // The order exists from here on: cleanup failures must not turn
        // a placed order into a reported failure.
        if let Err(error) = self.cart.clear().await {
            warn!(%error, order_id = %order.id, "order placed but cart cleanup failed");
        }

        Ok(order)
    }
}
