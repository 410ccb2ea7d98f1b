//! Product catalog commands.
//!
//! The catalog is fetched once per invocation and filtered, sorted, and
//! paginated locally.
//!
//! # Usage
//!
//! ```bash
//! cw products list --search shirt --min-price 10 --sort price-asc
//! cw products show 3
//! cw products categories
//! cw products related 3 --limit 4
//! ```

use cartwheel_client::{Catalog, CatalogView, FilterState, PriceRange, SortKey};
use cartwheel_core::{Money, ProductId};
use rust_decimal::Decimal;
use tracing::info;

use super::{CliContext, CliError};

/// Filters for `products list`.
pub struct ListOptions {
    /// Category to restrict to.
    pub category: Option<String>,
    /// Search term over title, description, and category.
    pub search: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
    /// Sort order.
    pub sort: Option<SortKey>,
    /// 1-based page to show.
    pub page: usize,
}

/// List products matching the given filters.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
pub async fn list(ctx: &CliContext, options: ListOptions) -> Result<(), CliError> {
    let catalog = Catalog::fetch(&ctx.api).await?;

    let mut filter = FilterState::with_page_size(ctx.config.page_size);
    if let Some(term) = options.search {
        filter.set_search(term);
    }
    filter.set_category(options.category);
    filter.set_price_range(PriceRange {
        min: options.min_price.map(Money::new),
        max: options.max_price.map(Money::new),
    });
    filter.set_sort(options.sort);
    // Last: search and category changes reset the page to 1.
    filter.set_page(options.page);

    match catalog.view(&filter) {
        CatalogView::Loading => info!("Catalog not loaded"),
        CatalogView::NoMatches => info!("No products match the current filters"),
        CatalogView::Page(page) => {
            info!(
                "Page {}/{} ({} matching products)",
                page.current_page, page.total_pages, page.filtered_count
            );
            for product in &page.items {
                info!(
                    "  #{} {} - {} [{}]",
                    product.id, product.title, product.price, product.category
                );
            }
        }
    }
    Ok(())
}

/// Show one product with its rating and reviews.
///
/// # Errors
///
/// Returns an error if the product does not exist or a request fails.
pub async fn show(ctx: &CliContext, id: i64) -> Result<(), CliError> {
    let product = ctx.api.product(ProductId::new(id)).await?;

    info!("#{} {}", product.id, product.title);
    info!("  Price: {}", product.price);
    info!("  Category: {}", product.category);
    if let Some(rating) = product.rating() {
        info!("  Rating: {:.1} ({} reviews)", rating.average, rating.count);
    }
    if !product.description.is_empty() {
        info!("  {}", product.description);
    }

    let reviews = ctx.api.product_reviews(product.id).await?;
    for review in &reviews {
        let name = review.user_name.as_deref().unwrap_or("anonymous");
        let comment = review.comment.as_deref().unwrap_or("");
        info!("  {}/5 by {name}: {comment}", review.rating);
    }
    Ok(())
}

/// List all product categories.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn categories(ctx: &CliContext) -> Result<(), CliError> {
    let categories = ctx.api.categories().await?;
    info!("{} categories", categories.len());
    for category in &categories {
        info!("  {category}");
    }
    Ok(())
}

/// Show products related to the given product.
///
/// # Errors
///
/// Returns an error if the product does not exist or a request fails.
pub async fn related(ctx: &CliContext, id: i64, limit: Option<usize>) -> Result<(), CliError> {
    let related = ctx.api.related_products(ProductId::new(id), limit).await?;
    if related.is_empty() {
        info!("No related products");
        return Ok(());
    }
    for product in &related {
        info!("  #{} {} - {}", product.id, product.title, product.price);
    }
    Ok(())
}
