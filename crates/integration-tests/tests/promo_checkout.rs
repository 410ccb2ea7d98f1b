//! Promo code and checkout tests: validation, discounted totals, and
//! the place-order flow including its cleanup step.

use cartwheel_client::{CartError, CheckoutError, CheckoutService};
use cartwheel_core::{Money, OrderStatus, ProductId};
use cartwheel_integration_tests::{TestContext, sample_address};
use rust_decimal::Decimal;

const RED_SHIRT: ProductId = ProductId::new(1);

// ============================================================================
// Promo Codes
// ============================================================================

#[tokio::test]
async fn test_validate_promo_reports_percentage() {
    let ctx = TestContext::new().await;

    // Validation is anonymous.
    let validation = ctx
        .api
        .validate_promo("SAVE10")
        .await
        .expect("validation call succeeds");

    assert!(validation.valid);
    assert_eq!(validation.discount_percentage, Some(Decimal::from(10)));
    assert_eq!(validation.message.as_deref(), Some("Promo code is valid"));
}

#[tokio::test]
async fn test_applied_promo_discounts_cart() {
    let ctx = TestContext::signed_in("alice").await;
    let mut cart = ctx.cart_service();
    cart.add_item(RED_SHIRT, 5).await.expect("add succeeds");

    let promo = cart.apply_promo("SAVE10").await.expect("valid code applies");
    assert_eq!(promo.percentage, Decimal::from(10));

    // 5x 20.00 = 100.00, minus 10%.
    let state = cart.fetch().await.expect("fetch succeeds");
    assert_eq!(state.subtotal(), Money::from_cents(100_00));
    assert_eq!(state.discount(), Money::from_cents(10_00));
    assert_eq!(state.total(), Money::from_cents(90_00));
}

#[tokio::test]
async fn test_rejected_promo_keeps_previous_one() {
    let ctx = TestContext::signed_in("alice").await;
    let mut cart = ctx.cart_service();
    cart.add_item(RED_SHIRT, 1).await.expect("add succeeds");
    cart.apply_promo("SAVE10").await.expect("valid code applies");

    let error = cart
        .apply_promo("BOGUS")
        .await
        .expect_err("unknown code is rejected");
    match error {
        CartError::InvalidPromo { message } => assert_eq!(message, "Invalid promo code"),
        other => panic!("expected InvalidPromo, got {other:?}"),
    }

    let state = cart.fetch().await.expect("fetch succeeds");
    assert_eq!(state.promo().map(|p| p.code.as_str()), Some("SAVE10"));
}

#[tokio::test]
async fn test_expired_promo_surfaces_server_message() {
    let ctx = TestContext::signed_in("alice").await;
    let mut cart = ctx.cart_service();

    let error = cart
        .apply_promo("EXPIRED50")
        .await
        .expect_err("expired code is rejected");

    match error {
        CartError::InvalidPromo { message } => assert_eq!(message, "Promo code has expired"),
        other => panic!("expected InvalidPromo, got {other:?}"),
    }
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let ctx = TestContext::signed_in("alice").await;
    let mut cart = ctx.cart_service();
    cart.add_item(RED_SHIRT, 5).await.expect("add succeeds");
    cart.apply_promo("SAVE10").await.expect("promo applies");
    let snapshot = cart.fetch().await.expect("fetch succeeds");

    let mut checkout = CheckoutService::new(ctx.api.clone(), ctx.cart_service());
    let order = checkout
        .place_order(&snapshot, &sample_address())
        .await
        .expect("checkout succeeds");

    assert_eq!(order.total_amount, Money::from_cents(90_00));
    assert_eq!(order.discount_amount, Money::from_cents(10_00));
    assert_eq!(order.promo_code.as_deref(), Some("SAVE10"));
    assert_eq!(order.status, OrderStatus::Pending);
    let item = order.order_items.first().expect("one order line");
    assert_eq!(item.product_title, "Red Shirt");
    assert_eq!(item.quantity, 5);

    // The cart and the persisted promo are gone once the order exists.
    let after = cart.fetch().await.expect("refetch succeeds");
    assert!(after.is_empty());
    assert!(after.promo().is_none());
}

#[tokio::test]
async fn test_empty_cart_checkout_never_posts() {
    let ctx = TestContext::signed_in("alice").await;
    let empty = ctx.cart_service().fetch().await.expect("fetch succeeds");

    let mut checkout = CheckoutService::new(ctx.api.clone(), ctx.cart_service());
    let error = checkout
        .place_order(&empty, &sample_address())
        .await
        .expect_err("empty cart is rejected");

    assert!(matches!(error, CheckoutError::EmptyCart));
    assert_eq!(ctx.backend.order_requests(), 0);
}

#[tokio::test]
async fn test_blank_address_rejected_before_the_network() {
    let ctx = TestContext::signed_in("alice").await;
    let mut cart = ctx.cart_service();
    cart.add_item(RED_SHIRT, 1).await.expect("add succeeds");
    let snapshot = cart.fetch().await.expect("fetch succeeds");

    let mut address = sample_address();
    address.email = "   ".to_owned();

    let before = ctx.backend.requests();
    let mut checkout = CheckoutService::new(ctx.api.clone(), ctx.cart_service());
    let error = checkout
        .place_order(&snapshot, &address)
        .await
        .expect_err("blank email is rejected");

    assert!(matches!(error, CheckoutError::MissingField("email")));
    assert_eq!(ctx.backend.requests(), before);
}
