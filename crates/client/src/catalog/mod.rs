//! Client-side catalog browsing: filter, sort and paginate.
//!
//! The product list is fetched once (and cached by the API client);
//! everything else happens locally. [`FilterState`] holds what the user
//! asked for, [`Catalog::view`] runs the fixed pipeline
//! category -> search -> price range -> sort -> paginate and returns a
//! renderable [`CatalogView`].

use std::cmp::Ordering;
use std::str::FromStr;

use cartwheel_core::Money;
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError};
use crate::api::types::Product;

pub mod debounce;

/// Default number of products per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

// ============================================================================
// FilterState
// ============================================================================

/// Sort orders for the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
    /// Title A-Z, case-insensitive.
    NameAsc,
    /// Title Z-A, case-insensitive.
    NameDesc,
    /// Best-rated first; products without a rating sort as 0.
    RatingDesc,
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::RatingDesc => "rating-desc",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            "name-asc" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            "rating-desc" => Ok(Self::RatingDesc),
            _ => Err(format!(
                "invalid sort key: {s} (expected one of price-asc, price-desc, \
                 name-asc, name-desc, rating-desc)"
            )),
        }
    }
}

/// An inclusive price range; each bound is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceRange {
    /// Lower bound, inclusive.
    pub min: Option<Money>,
    /// Upper bound, inclusive.
    pub max: Option<Money>,
}

impl PriceRange {
    /// True when `price` falls inside the range.
    #[must_use]
    pub fn contains(&self, price: Money) -> bool {
        if let Some(min) = self.min
            && price < min
        {
            return false;
        }
        if let Some(max) = self.max
            && price > max
        {
            return false;
        }
        true
    }

    /// True when neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// What the user asked the catalog for.
///
/// Filters are conjunctive: selecting a category narrows the search
/// results and vice versa; changing one never clears another. Setting
/// the search term or the category resets the page to 1 (the old page
/// number is meaningless against a new result set); setting the sort or
/// the price range does not.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    search: String,
    category: Option<String>,
    price_range: PriceRange,
    sort: Option<SortKey>,
    page: usize,
    page_size: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterState {
    /// Everything unfiltered, page 1, default page size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Everything unfiltered with a custom page size (clamped to >= 1).
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            search: String::new(),
            category: None,
            price_range: PriceRange::default(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Set the (already debounced) search term. Resets the page to 1.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 1;
    }

    /// Select a category, or `None` for all. Resets the page to 1 but
    /// keeps the search term.
    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
        self.page = 1;
    }

    /// Set the price range. Does not reset the page.
    pub fn set_price_range(&mut self, range: PriceRange) {
        self.price_range = range;
    }

    /// Set the sort order, or `None` for catalog order. Does not reset
    /// the page.
    pub fn set_sort(&mut self, sort: Option<SortKey>) {
        self.sort = sort;
    }

    /// Jump to a page (1-based; 0 is treated as 1).
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// The current search term.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// The selected category, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// The price range filter.
    #[must_use]
    pub const fn price_range(&self) -> PriceRange {
        self.price_range
    }

    /// The sort order, if any.
    #[must_use]
    pub const fn sort(&self) -> Option<SortKey> {
        self.sort
    }

    /// The requested page (1-based). May exceed the last page; the view
    /// clamps it.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Products per page.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// One rendered page of catalog results.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    /// The products on this page, in pipeline order.
    pub items: Vec<Product>,
    /// The page actually shown (the requested page clamped to range).
    pub current_page: usize,
    /// Total pages for the filtered set.
    pub total_pages: usize,
    /// How many products survived filtering, across all pages.
    pub filtered_count: usize,
}

/// What the catalog has to show for a given filter state.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogView {
    /// Products have not been fetched yet.
    Loading,
    /// Products are loaded but nothing matches the filters.
    NoMatches,
    /// A page of matching products.
    Page(CatalogPage),
}

/// The product catalog, fetched once and filtered locally.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Option<Vec<Product>>,
}

impl Catalog {
    /// An empty catalog in the `Loading` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog over an already-fetched product list.
    #[must_use]
    pub const fn loaded(products: Vec<Product>) -> Self {
        Self {
            products: Some(products),
        }
    }

    /// Fetch the full product list through the API client (cached there
    /// for five minutes).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn fetch(api: &ApiClient) -> Result<Self, ApiError> {
        let products = api.products().await?;
        Ok(Self::loaded(products))
    }

    /// True once products have been fetched.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.products.is_some()
    }

    /// Distinct category names in first-seen order. Empty while loading.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for product in self.products.as_deref().unwrap_or(&[]) {
            if !seen.contains(&product.category) {
                seen.push(product.category.clone());
            }
        }
        seen
    }

    /// Run the filter pipeline and return what to render.
    ///
    /// Pipeline, in fixed order: category -> search -> price range ->
    /// stable sort -> paginate. The requested page is clamped into the
    /// valid range.
    #[must_use]
    pub fn view(&self, filter: &FilterState) -> CatalogView {
        let Some(products) = &self.products else {
            return CatalogView::Loading;
        };

        let mut matches: Vec<&Product> = products
            .iter()
            .filter(|p| {
                filter
                    .category()
                    .is_none_or(|c| p.category.eq_ignore_ascii_case(c))
            })
            .filter(|p| matches_search(p, filter.search()))
            .filter(|p| filter.price_range().contains(p.price))
            .collect();

        if matches.is_empty() {
            return CatalogView::NoMatches;
        }

        if let Some(sort) = filter.sort() {
            // Vec::sort_by is stable: ties keep their original relative
            // order, so pagination is reproducible.
            matches.sort_by(|a, b| compare(a, b, sort));
        }

        let filtered_count = matches.len();
        let total_pages = filtered_count.div_ceil(filter.page_size());
        let current_page = filter.page().min(total_pages);

        let items = matches
            .into_iter()
            .skip((current_page - 1) * filter.page_size())
            .take(filter.page_size())
            .cloned()
            .collect();

        CatalogView::Page(CatalogPage {
            items,
            current_page,
            total_pages,
            filtered_count,
        })
    }
}

/// Case-insensitive substring match against title, description or
/// category. An empty term matches everything.
fn matches_search(product: &Product, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    product.title.to_lowercase().contains(&needle)
        || product.description.to_lowercase().contains(&needle)
        || product.category.to_lowercase().contains(&needle)
}

fn compare(a: &Product, b: &Product, sort: SortKey) -> Ordering {
    match sort {
        SortKey::PriceAsc => a.price.cmp(&b.price),
        SortKey::PriceDesc => b.price.cmp(&a.price),
        SortKey::NameAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::NameDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
        SortKey::RatingDesc => {
            let rating = |p: &Product| p.rating().map_or(0.0, |r| r.average);
            rating(b).total_cmp(&rating(a))
        }
    }
}
