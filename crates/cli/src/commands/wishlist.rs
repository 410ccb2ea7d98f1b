//! Wishlist commands.
//!
//! # Usage
//!
//! ```bash
//! cw wishlist list
//! cw wishlist toggle 3
//! cw wishlist check 3
//! ```

use cartwheel_core::ProductId;
use tracing::info;

use super::{CliContext, CliError};

/// List wishlist entries.
///
/// # Errors
///
/// Returns an error if not signed in or the request fails.
pub async fn list(ctx: &CliContext) -> Result<(), CliError> {
    let entries = ctx.api.wishlist().await?;
    if entries.is_empty() {
        info!("Wishlist is empty");
        return Ok(());
    }
    for entry in &entries {
        info!(
            "  #{} {} - {} (added {})",
            entry.product.id, entry.product.title, entry.product.price, entry.added_at
        );
    }
    Ok(())
}

/// Add or remove a product from the wishlist.
///
/// # Errors
///
/// Returns an error if not signed in or the request fails.
pub async fn toggle(ctx: &CliContext, id: i64) -> Result<(), CliError> {
    let status = ctx.api.toggle_wishlist(ProductId::new(id)).await?;
    match status.message {
        Some(message) => info!("{message}"),
        None => info!("In wishlist: {}", status.in_wishlist),
    }
    Ok(())
}

/// Check whether a product is in the wishlist.
///
/// # Errors
///
/// Returns an error if not signed in or the request fails.
pub async fn check(ctx: &CliContext, id: i64) -> Result<(), CliError> {
    let product_id = ProductId::new(id);
    let in_wishlist = ctx.api.wishlist_contains(product_id).await?;
    if in_wishlist {
        info!("Product {product_id} is in the wishlist");
    } else {
        info!("Product {product_id} is not in the wishlist");
    }
    Ok(())
}
