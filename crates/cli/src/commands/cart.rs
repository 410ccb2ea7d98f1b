//! Cart commands.
//!
//! Signed in, every mutation goes to the server and the cart shown is the
//! server's. Signed out, mutations go to the offline cart in the state
//! file; `cw cart sync` pushes those lines to the server after signing in.
//!
//! # Usage
//!
//! ```bash
//! cw cart add 3 --quantity 2
//! cw cart update 3 --quantity 5
//! cw cart promo apply SAVE10
//! cw cart show
//! cw cart sync
//! ```

use cartwheel_client::{Cart, CartService, OfflineCart};
use cartwheel_core::ProductId;
use tracing::info;

use super::{CliContext, CliError};

fn cart_service(ctx: &CliContext) -> CartService {
    CartService::new(ctx.api.clone(), ctx.storage.clone())
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        info!("Cart is empty");
        return;
    }
    for line in cart.lines() {
        info!(
            "  #{} {} x{} @ {} = {}",
            line.product_id,
            line.title,
            line.quantity,
            line.unit_price,
            line.line_total()
        );
    }
    info!("Subtotal: {}", cart.subtotal());
    if let Some(promo) = cart.promo() {
        info!(
            "Promo {} ({}% off): -{}",
            promo.code,
            promo.percentage,
            cart.discount()
        );
    }
    info!("Total: {}", cart.total());
}

/// Show the cart with totals.
///
/// # Errors
///
/// Returns an error if the cart cannot be fetched or read.
pub async fn show(ctx: &CliContext) -> Result<(), CliError> {
    if ctx.session.is_authenticated() {
        let cart = cart_service(ctx).fetch().await?;
        print_cart(&cart);
    } else {
        let offline = OfflineCart::load(ctx.storage.clone())?;
        info!("Not signed in; showing the offline cart");
        print_cart(offline.cart());
    }
    Ok(())
}

/// Add a product to the cart.
///
/// # Errors
///
/// Returns an error if the product does not exist or the cart cannot be
/// updated.
pub async fn add(ctx: &CliContext, product_id: i64, quantity: u32) -> Result<(), CliError> {
    let product_id = ProductId::new(product_id);
    if ctx.session.is_authenticated() {
        let mut service = cart_service(ctx);
        let cart = service.add_item(product_id, quantity).await?;
        print_cart(&cart);
    } else {
        let product = ctx.api.product(product_id).await?;
        let mut offline = OfflineCart::load(ctx.storage.clone())?;
        offline.add_line(&product, quantity)?;
        info!("Saved offline; sign in and run `cw cart sync` to push");
        print_cart(offline.cart());
    }
    Ok(())
}

/// Set the quantity of a cart line. Zero is ignored.
///
/// # Errors
///
/// Returns an error if the cart cannot be updated.
pub async fn update(ctx: &CliContext, product_id: i64, quantity: u32) -> Result<(), CliError> {
    let product_id = ProductId::new(product_id);
    if ctx.session.is_authenticated() {
        let mut service = cart_service(ctx);
        let cart = service.update_quantity(product_id, quantity).await?;
        print_cart(&cart);
    } else {
        let mut offline = OfflineCart::load(ctx.storage.clone())?;
        offline.update_quantity(product_id, quantity)?;
        print_cart(offline.cart());
    }
    Ok(())
}

/// Remove a product from the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be updated.
pub async fn remove(ctx: &CliContext, product_id: i64) -> Result<(), CliError> {
    let product_id = ProductId::new(product_id);
    if ctx.session.is_authenticated() {
        let mut service = cart_service(ctx);
        let cart = service.remove_item(product_id).await?;
        print_cart(&cart);
    } else {
        let mut offline = OfflineCart::load(ctx.storage.clone())?;
        offline.remove_line(product_id)?;
        print_cart(offline.cart());
    }
    Ok(())
}

/// Remove every item from the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be cleared.
pub async fn clear(ctx: &CliContext) -> Result<(), CliError> {
    if ctx.session.is_authenticated() {
        cart_service(ctx).clear().await?;
    } else {
        OfflineCart::load(ctx.storage.clone())?.clear()?;
    }
    info!("Cart cleared");
    Ok(())
}

/// Show the cart item count. Zero when signed out.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn count(ctx: &CliContext) -> Result<(), CliError> {
    let count = cart_service(ctx).item_count().await?;
    info!("{count} items in cart");
    Ok(())
}

/// Validate a promo code against the server and apply it.
///
/// # Errors
///
/// Returns an error if the code is invalid or the request fails.
pub async fn apply_promo(ctx: &CliContext, code: &str) -> Result<(), CliError> {
    let mut service = cart_service(ctx);
    let promo = service.apply_promo(code).await?;
    info!("Applied promo {} ({}% off)", promo.code, promo.percentage);
    Ok(())
}

/// Remove the applied promo code.
///
/// # Errors
///
/// Returns an error if the state file cannot be written.
pub fn remove_promo(ctx: &CliContext) -> Result<(), CliError> {
    let mut service = cart_service(ctx);
    service.remove_promo()?;
    info!("Promo removed");
    Ok(())
}

/// Push offline cart lines to the server cart.
///
/// # Errors
///
/// Returns an error if not signed in or a push fails; lines not yet pushed
/// stay in the offline cart.
pub async fn sync(ctx: &CliContext) -> Result<(), CliError> {
    let mut offline = OfflineCart::load(ctx.storage.clone())?;
    if offline.cart().is_empty() {
        info!("Offline cart is empty; nothing to push");
        return Ok(());
    }
    let mut service = cart_service(ctx);
    let cart = service.reconcile(&mut offline).await?;
    print_cart(&cart);
    Ok(())
}
