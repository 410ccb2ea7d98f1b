//! Order status poller tests against the live mock backend: initial
//! snapshot, status-change propagation, and recovery from auth failures.

use std::time::Duration;

use cartwheel_client::OrderStatusPoller;
use cartwheel_client::api::{Order, OrderItemRequest, OrderRequest};
use cartwheel_core::{Money, OrderStatus, ProductId};
use cartwheel_integration_tests::{TestContext, sample_address};
use tokio::time::timeout;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const DEADLINE: Duration = Duration::from_secs(5);

/// Place a minimal one-line order.
async fn place_test_order(ctx: &TestContext) -> Order {
    let address = sample_address();
    let request = OrderRequest {
        total_amount: Money::from_cents(20_00),
        discount_amount: Money::ZERO,
        promo_code: None,
        items: vec![OrderItemRequest {
            product_id: ProductId::new(1),
            quantity: 1,
            price: Money::from_cents(20_00),
        }],
        full_name: address.full_name,
        email: address.email,
        phone: address.phone,
        street: address.street,
        city: address.city,
        state: address.state,
        zip_code: address.zip_code,
        country: address.country,
    };
    ctx.api
        .place_order(&request)
        .await
        .expect("Failed to place test order")
}

// ============================================================================
// Snapshots
// ============================================================================

#[tokio::test]
async fn test_poller_publishes_initial_snapshot() {
    let ctx = TestContext::signed_in("alice").await;
    let order = place_test_order(&ctx).await;

    let poller = OrderStatusPoller::new(ctx.api.clone())
        .with_interval(POLL_INTERVAL)
        .spawn();
    let mut snapshots = poller.subscribe();

    timeout(DEADLINE, snapshots.changed())
        .await
        .expect("first snapshot within deadline")
        .expect("poller alive");

    let snapshot = snapshots.borrow_and_update().clone();
    let entry = snapshot.first().expect("snapshot contains the order");
    assert_eq!(entry.id, order.id);
    assert_eq!(entry.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_poller_observes_status_change() {
    let ctx = TestContext::signed_in("alice").await;
    let order = place_test_order(&ctx).await;

    let poller = OrderStatusPoller::new(ctx.api.clone())
        .with_interval(POLL_INTERVAL)
        .spawn();
    let mut snapshots = poller.subscribe();

    timeout(DEADLINE, snapshots.changed())
        .await
        .expect("first snapshot within deadline")
        .expect("poller alive");

    ctx.backend
        .set_order_status(order.id, OrderStatus::Processing);

    // The next successful tick must pick up the new status.
    loop {
        timeout(DEADLINE, snapshots.changed())
            .await
            .expect("status change within deadline")
            .expect("poller alive");
        let status = snapshots
            .borrow_and_update()
            .first()
            .map(|entry| entry.status);
        if status == Some(OrderStatus::Processing) {
            break;
        }
    }
}

// ============================================================================
// Failure Handling
// ============================================================================

#[tokio::test]
async fn test_poller_survives_auth_failures_until_sign_in() {
    let ctx = TestContext::new().await;

    // Anonymous polls fail before the network and publish nothing.
    let poller = OrderStatusPoller::new(ctx.api.clone())
        .with_interval(POLL_INTERVAL)
        .spawn();
    let mut snapshots = poller.subscribe();

    tokio::time::sleep(POLL_INTERVAL * 3).await;
    assert!(poller.latest().is_empty());
    assert_eq!(ctx.backend.requests(), 0);

    ctx.sign_in("alice");
    let order = place_test_order(&ctx).await;

    // The same task starts publishing once a token is held.
    loop {
        timeout(DEADLINE, snapshots.changed())
            .await
            .expect("snapshot within deadline")
            .expect("poller alive");
        let found = snapshots
            .borrow_and_update()
            .iter()
            .any(|entry| entry.id == order.id);
        if found {
            break;
        }
    }
}
