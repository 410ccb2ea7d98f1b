//! Order history and background status polling.
//!
//! Order fetches and cancellation live on [`ApiClient`]
//! ([`ApiClient::my_orders`], [`ApiClient::cancel_order`] - the server
//! only accepts cancelling your own PENDING orders and its message is
//! surfaced verbatim). This module adds the [`OrderStatusPoller`], a
//! named scheduled task that keeps an order snapshot fresh while a
//! status view is open.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::api::ApiClient;
use crate::api::types::Order;

/// Default time between order status refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Periodically fetches the account's orders and publishes snapshots.
///
/// The poller ticks on a fixed [`tokio::time::interval`] (first fetch
/// immediately on spawn). A failed tick is logged at debug level and
/// silently retried on the next one - subscribers only ever observe
/// successful snapshots. The task stops when its [`PollerHandle`] is
/// dropped or aborted.
#[derive(Debug)]
pub struct OrderStatusPoller {
    api: ApiClient,
    interval: Duration,
}

impl OrderStatusPoller {
    /// Build a poller with the default 30-second interval.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self {
            api,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start the background task and hand back its handle.
    #[must_use]
    pub fn spawn(self) -> PollerHandle {
        let (tx, snapshots) = watch::channel(Vec::new());
        let task = tokio::spawn(run(self.api, self.interval, tx));
        PollerHandle { snapshots, task }
    }
}

/// Handle to a running [`OrderStatusPoller`] task.
///
/// Dropping the handle aborts the task.
#[derive(Debug)]
pub struct PollerHandle {
    snapshots: watch::Receiver<Vec<Order>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Subscribe to order snapshots. The initial value is empty until
    /// the first successful fetch lands.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Order>> {
        self.snapshots.clone()
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn latest(&self) -> Vec<Order> {
        self.snapshots.borrow().clone()
    }

    /// Stop the poller without waiting for the next tick.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(api: ApiClient, interval: Duration, snapshots: watch::Sender<Vec<Order>>) {
    let mut ticker = tokio::time::interval(interval);
    // Keep the cadence fixed instead of bursting after a stall
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match api.my_orders().await {
            Ok(orders) => {
                debug!(count = orders.len(), "order snapshot refreshed");
                if snapshots.send(orders).is_err() {
                    break; // every receiver is gone
                }
            }
            Err(error) => {
                debug!(%error, "order status poll failed, retrying next tick");
            }
        }
    }
}
