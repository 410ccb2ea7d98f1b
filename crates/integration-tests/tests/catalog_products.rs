//! Catalog tests over the wire: product endpoints, the client-side
//! response cache, and the filter pipeline on a fetched catalog.

use cartwheel_client::{ApiError, Catalog, CatalogView, FilterState, SortKey};
use cartwheel_core::{Money, ProductId};
use cartwheel_integration_tests::TestContext;

const RED_SHIRT: ProductId = ProductId::new(1);

// ============================================================================
// Product Endpoints
// ============================================================================

#[tokio::test]
async fn test_products_returns_seeded_catalog() {
    let ctx = TestContext::new().await;

    let products = ctx.api.products().await.expect("product list loads");
    assert_eq!(products.len(), 8);

    let red_shirt = products
        .iter()
        .find(|p| p.id == RED_SHIRT)
        .expect("seed contains the red shirt");
    assert_eq!(red_shirt.title, "Red Shirt");
    assert_eq!(red_shirt.price, Money::from_cents(20_00));
    assert_eq!(red_shirt.category, "clothing");

    let rating = red_shirt.rating().expect("red shirt is rated");
    assert!((rating.average - 4.5).abs() < f64::EPSILON);
    assert_eq!(rating.count, 10);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::new().await;

    let error = ctx
        .api
        .product(ProductId::new(999))
        .await
        .expect_err("unknown id fails");

    match error {
        ApiError::NotFound(path) => assert!(path.contains("/products/999")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_category_endpoints() {
    let ctx = TestContext::new().await;

    let electronics = ctx
        .api
        .products_by_category("electronics")
        .await
        .expect("category filter loads");
    assert_eq!(electronics.len(), 3);
    assert!(electronics.iter().all(|p| p.category == "electronics"));

    // Category names come back in first-seen catalog order.
    let categories = ctx.api.categories().await.expect("categories load");
    assert_eq!(categories, ["clothing", "electronics", "home"]);
}

#[tokio::test]
async fn test_related_products_share_category() {
    let ctx = TestContext::new().await;

    let related = ctx
        .api
        .related_products(RED_SHIRT, None)
        .await
        .expect("related products load");
    assert_eq!(related.len(), 2);
    assert!(
        related
            .iter()
            .all(|p| p.category == "clothing" && p.id != RED_SHIRT)
    );

    let limited = ctx
        .api
        .related_products(RED_SHIRT, Some(1))
        .await
        .expect("limited related products load");
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_reviews_for_product() {
    let ctx = TestContext::new().await;

    let reviews = ctx
        .api
        .product_reviews(RED_SHIRT)
        .await
        .expect("reviews load");

    assert_eq!(reviews.len(), 2);
    let first = reviews.first().expect("at least one review");
    assert_eq!(first.rating, 5);
    assert_eq!(first.user_name.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_repeat_product_fetch_is_served_from_cache() {
    let ctx = TestContext::new().await;

    ctx.api.products().await.expect("first fetch succeeds");
    let after_first = ctx.backend.requests();

    ctx.api.products().await.expect("second fetch succeeds");
    assert_eq!(ctx.backend.requests(), after_first);
}

// ============================================================================
// Filter Pipeline
// ============================================================================

#[tokio::test]
async fn test_filter_pipeline_over_fetched_catalog() {
    let ctx = TestContext::new().await;
    let catalog = Catalog::fetch(&ctx.api).await.expect("catalog loads");

    let mut filter = FilterState::new();
    filter.set_category(Some("clothing".to_owned()));
    filter.set_sort(Some(SortKey::PriceAsc));

    match catalog.view(&filter) {
        CatalogView::Page(page) => {
            let titles: Vec<&str> = page.items.iter().map(|p| p.title.as_str()).collect();
            assert_eq!(titles, ["Green Scarf", "Blue Hat", "Red Shirt"]);
            assert_eq!(page.filtered_count, 3);
            assert_eq!(page.current_page, 1);
        }
        other => panic!("expected a page, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_narrows_and_reports_no_matches() {
    let ctx = TestContext::new().await;
    let catalog = Catalog::fetch(&ctx.api).await.expect("catalog loads");

    let mut filter = FilterState::new();
    filter.set_search("cable");
    match catalog.view(&filter) {
        CatalogView::Page(page) => {
            let only = page.items.first().expect("one match");
            assert_eq!(page.items.len(), 1);
            assert_eq!(only.title, "USB Cable");
        }
        other => panic!("expected a page, got {other:?}"),
    }

    filter.set_search("no such product");
    assert_eq!(catalog.view(&filter), CatalogView::NoMatches);
}
