//! Checkout command.
//!
//! Fetches the server cart, validates the shipping address, places the
//! order, and clears the cart and promo on success.
//!
//! # Usage
//!
//! ```bash
//! cw checkout --full-name "Ada Lovelace" --email ada@example.com \
//!     --phone 555-0100 --street "1 Analytical Way" --city London \
//!     --state LDN --zip-code "EC1A 1BB" --country UK
//! ```

use cartwheel_client::{Address, CartService, CheckoutService};
use tracing::info;

use super::{CliContext, CliError};

/// Place an order for the current cart contents.
///
/// # Errors
///
/// Returns an error if the cart is empty, the address is incomplete, or
/// the order is rejected by the server.
pub async fn place_order(ctx: &CliContext, address: Address) -> Result<(), CliError> {
    let cart_service = CartService::new(ctx.api.clone(), ctx.storage.clone());
    let cart = cart_service.fetch().await?;

    let mut checkout = CheckoutService::new(ctx.api.clone(), cart_service);
    let order = checkout.place_order(&cart, &address).await?;

    info!("Order #{} placed", order.id);
    if !order.discount_amount.is_zero() {
        info!("  Discount: -{}", order.discount_amount);
    }
    info!("  Total: {}", order.total_amount);
    info!("  Status: {}", order.status);
    Ok(())
}
