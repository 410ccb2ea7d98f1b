//! Order history commands.
//!
//! # Usage
//!
//! ```bash
//! cw orders list
//! cw orders watch --interval-secs 10
//! cw orders cancel 12
//! ```

use std::time::Duration;

use cartwheel_client::OrderStatusPoller;
use cartwheel_core::OrderId;
use tracing::info;

use super::{CliContext, CliError};

/// List the account's orders.
///
/// # Errors
///
/// Returns an error if not signed in or the request fails.
pub async fn list(ctx: &CliContext) -> Result<(), CliError> {
    let orders = ctx.api.my_orders().await?;
    if orders.is_empty() {
        info!("No orders yet");
        return Ok(());
    }
    for order in &orders {
        info!(
            "#{} {} - {} ({} items), placed {}",
            order.id,
            order.status,
            order.total_amount,
            order.order_items.len(),
            order.order_date
        );
    }
    Ok(())
}

/// Poll order statuses, printing each snapshot, until interrupted.
///
/// # Errors
///
/// Returns an error if not signed in.
pub async fn watch(ctx: &CliContext, interval_secs: Option<u64>) -> Result<(), CliError> {
    let interval = interval_secs.map_or(ctx.config.order_poll_interval, Duration::from_secs);
    let handle = OrderStatusPoller::new(ctx.api.clone())
        .with_interval(interval)
        .spawn();
    let mut snapshots = handle.subscribe();

    info!(
        "Watching orders every {}s (Ctrl-C to stop)",
        interval.as_secs()
    );
    while snapshots.changed().await.is_ok() {
        let orders = snapshots.borrow_and_update().clone();
        if orders.is_empty() {
            info!("No orders yet");
        }
        for order in &orders {
            info!("#{} {}", order.id, order.status);
        }
    }
    Ok(())
}

/// Cancel a pending order.
///
/// # Errors
///
/// Returns an error if the order is not cancellable, belongs to another
/// account, or the request fails.
pub async fn cancel(ctx: &CliContext, id: i64) -> Result<(), CliError> {
    let message = ctx.api.cancel_order(OrderId::new(id)).await?;
    info!("{}", message.message);
    Ok(())
}
