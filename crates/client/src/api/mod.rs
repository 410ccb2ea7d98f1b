//! Typed client for the storefront REST API.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP via `reqwest`; one method per endpoint
//! - The server is the source of truth for cart, orders, wishlist and
//!   profile - those calls always hit the network
//! - Catalog reads are cached in-memory via `moka` (5 minute TTL)
//! - Bearer tokens come from the shared [`Session`]; any 401 clears it
//!   before the error is surfaced
//! - Every request carries a fresh `x-request-id` for log correlation
//!
//! # Example
//!
//! ```rust,ignore
//! use cartwheel_client::{ApiClient, Session};
//!
//! let api = ApiClient::new(&config, session)?;
//!
//! // Browse the catalog (cached)
//! let products = api.products().await?;
//!
//! // Cart operations need a signed-in session
//! api.add_to_cart(products[0].id, 2).await?;
//! let cart = api.cart().await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use cartwheel_core::{OrderId, ProductId};
use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::session::Session;

mod cache;
pub mod error;
pub mod types;

pub use error::ApiError;
pub use types::*;

use cache::CacheValue;

/// Header used to correlate client requests with server logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// How long catalog responses stay cached.
const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Maximum number of cached catalog responses.
const CACHE_CAPACITY: u64 = 1000;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheaply cloneable; all clones share the HTTP connection pool, the
/// session and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    /// Base URL without a trailing slash, e.g. `http://localhost:8081/api`.
    base: String,
    session: Session,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        let base = config.api_url.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base,
                session,
                cache,
            }),
        })
    }

    /// The session this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Build the `Authorization` header value, or fail before any
    /// network traffic when no token is held.
    fn bearer(&self) -> Result<String, ApiError> {
        self.inner
            .session
            .token()
            .map(|token| format!("Bearer {}", token.expose_secret()))
            .ok_or(ApiError::AuthRequired)
    }

    /// Attach the bearer token if one is held. Used by endpoints that
    /// accept anonymous callers.
    fn maybe_bearer(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.inner.session.token() {
            Some(token) => request.header(
                AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            ),
            None => request,
        }
    }

    /// Send a request and map the response.
    ///
    /// Centralizes the status-code contract: 401 clears the session and
    /// becomes [`ApiError::AuthRequired`], 404 becomes
    /// [`ApiError::NotFound`], 429 becomes [`ApiError::RateLimited`], any
    /// other non-success becomes [`ApiError::Api`] with the server's
    /// `{"error": ...}` message when present.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let request = request
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .build()?;
        let path = request.url().path().to_owned();

        let response = self.inner.client.execute(request).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            debug!(%path, "server rejected token, clearing session");
            self.inner.session.clear_on_unauthorized();
            return Err(ApiError::AuthRequired);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<types::ErrorBody>(&body).map_or_else(
                |_| body.chars().take(200).collect::<String>(),
                |parsed| parsed.error,
            );
            debug!(status = %status, %message, %path, "API returned error");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                %path,
                body = %body.chars().take(500).collect::<String>(),
                "failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the full product catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let cache_key = "products".to_string();

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let url = format!("{}/products", self.inner.base);
        let products: Vec<Product> = self.execute(self.inner.client.get(&url)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist, or
    /// another error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{product_id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = format!("{}/products/{product_id}", self.inner.base);
        let product: Product = self.execute(self.inner.client.get(&url)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get all products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!("category:{category}");

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(products);
        }

        let url = format!(
            "{}/products/category/{}",
            self.inner.base,
            urlencoding::encode(category)
        );
        let products: Vec<Product> = self.execute(self.inner.client.get(&url)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get the list of category names.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = format!("{}/products/categories", self.inner.base);
        let categories: Vec<String> = self.execute(self.inner.client.get(&url)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Get products related to the given one (same category, excluding
    /// the product itself).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn related_products(
        &self,
        product_id: ProductId,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!("related:{product_id}:{}", limit.unwrap_or(0));

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for related products");
            return Ok(products);
        }

        let mut url = format!("{}/products/{product_id}/related", self.inner.base);
        if let Some(limit) = limit {
            url.push_str(&format!("?limit={limit}"));
        }
        let products: Vec<Product> = self.execute(self.inner.client.get(&url)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get the reviews for a product. Not cached - reviews change more
    /// often than the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, ApiError> {
        let url = format!("{}/reviews/product/{product_id}", self.inner.base);
        self.execute(self.inner.client.get(&url)).await
    }

    // =========================================================================
    // Promo Methods
    // =========================================================================

    /// Validate a promo code. Never cached - codes carry validity windows
    /// the server must evaluate at call time.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails. An *invalid* code is
    /// not an error here; check [`PromoValidation::valid`].
    #[instrument(skip(self), fields(code = %code))]
    pub async fn validate_promo(&self, code: &str) -> Result<PromoValidation, ApiError> {
        let url = format!(
            "{}/promo-codes/validate/{}",
            self.inner.base,
            urlencoding::encode(code)
        );
        self.execute(self.inner.client.get(&url)).await
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Get the signed-in account's cart entries.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self))]
    pub async fn cart(&self) -> Result<Vec<CartEntry>, ApiError> {
        let url = format!("{}/cart", self.inner.base);
        let request = self
            .inner
            .client
            .get(&url)
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    /// Add a product to the cart. The server merges quantities when the
    /// product is already present.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = quantity))]
    pub async fn add_to_cart(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartMutation, ApiError> {
        let url = format!("{}/cart/add", self.inner.base);
        let request = self
            .inner
            .client
            .post(&url)
            .query(&[
                ("productId", product_id.to_string()),
                ("quantity", quantity.to_string()),
            ])
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = quantity))]
    pub async fn update_cart_item(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartMutation, ApiError> {
        let url = format!("{}/cart/update", self.inner.base);
        let request = self
            .inner
            .client
            .put(&url)
            .query(&[
                ("productId", product_id.to_string()),
                ("quantity", quantity.to_string()),
            ])
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_cart(&self, product_id: ProductId) -> Result<CartMutation, ApiError> {
        let url = format!("{}/cart/remove/{product_id}", self.inner.base);
        let request = self
            .inner
            .client
            .delete(&url)
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    /// Remove every entry from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<CartMutation, ApiError> {
        let url = format!("{}/cart/clear", self.inner.base);
        let request = self
            .inner
            .client
            .delete(&url)
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    /// Get the cart item count. Anonymous callers get 0 instead of an
    /// error, so this is safe to poll from a badge or prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn cart_count(&self) -> Result<u32, ApiError> {
        let url = format!("{}/cart/count", self.inner.base);
        let request = self.maybe_bearer(self.inner.client.get(&url));
        let count: CartCount = self.execute(request).await?;
        Ok(count.cart_item_count)
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self, request))]
    pub async fn place_order(&self, request: &OrderRequest) -> Result<Order, ApiError> {
        let url = format!("{}/orders", self.inner.base);
        let request = self
            .inner
            .client
            .post(&url)
            .json(request)
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    /// Get the signed-in account's orders, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        let url = format!("{}/orders/my-orders", self.inner.base);
        let request = self
            .inner
            .client
            .get(&url)
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    /// Cancel an order. Only the owner's PENDING orders can be
    /// cancelled; anything else comes back as [`ApiError::Api`] with the
    /// server's explanation.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<ApiMessage, ApiError> {
        let url = format!("{}/orders/{order_id}", self.inner.base);
        let request = self
            .inner
            .client
            .delete(&url)
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    // =========================================================================
    // Wishlist Methods
    // =========================================================================

    /// Get the signed-in account's wishlist.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self))]
    pub async fn wishlist(&self) -> Result<Vec<WishlistEntry>, ApiError> {
        let url = format!("{}/wishlist", self.inner.base);
        let request = self
            .inner
            .client
            .get(&url)
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    /// Check whether a product is in the wishlist.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn wishlist_contains(&self, product_id: ProductId) -> Result<bool, ApiError> {
        let url = format!("{}/wishlist/check/{product_id}", self.inner.base);
        let request = self
            .inner
            .client
            .get(&url)
            .header(AUTHORIZATION, self.bearer()?);
        let status: WishlistStatus = self.execute(request).await?;
        Ok(status.in_wishlist)
    }

    /// Toggle a product in or out of the wishlist.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn toggle_wishlist(&self, product_id: ProductId) -> Result<WishlistStatus, ApiError> {
        let url = format!("{}/wishlist/toggle/{product_id}", self.inner.base);
        let request = self
            .inner
            .client
            .post(&url)
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    /// Get the signed-in account's profile.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let url = format!("{}/users/profile", self.inner.base);
        let request = self
            .inner
            .client
            .get(&url)
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    /// Update the signed-in account's profile. Only the fields set in
    /// `update` change.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] when not signed in, or another
    /// error if the API request fails.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let url = format!("{}/users/profile", self.inner.base);
        let request = self
            .inner
            .client
            .put(&url)
            .json(update)
            .header(AUTHORIZATION, self.bearer()?);
        self.execute(request).await
    }

    // =========================================================================
    // Cache Control
    // =========================================================================

    /// Drop all cached catalog data. Call after anything that invalidates
    /// product state out of band.
    pub async fn invalidate_catalog_cache(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.inner.base)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn test_client(base: &str) -> ApiClient {
        let storage = MemoryStorage::shared();
        let session = Session::restore(storage).unwrap();
        let config = ClientConfig::new(base.parse().unwrap());
        ApiClient::new(&config, session).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = test_client("http://localhost:8081/api/");
        assert_eq!(client.inner.base, "http://localhost:8081/api");
    }

    #[test]
    fn test_bearer_requires_token() {
        let client = test_client("http://localhost:8081/api");
        assert!(matches!(client.bearer(), Err(ApiError::AuthRequired)));
    }

    #[test]
    fn test_bearer_uses_session_token() {
        let client = test_client("http://localhost:8081/api");
        client
            .session()
            .login(secrecy::SecretString::from("tok-123"), None)
            .unwrap();
        assert_eq!(client.bearer().unwrap(), "Bearer tok-123");
    }
}
