//! Integration test harness for Cartwheel.
//!
//! Spawns the REST API the client talks to as an in-process axum server on
//! an ephemeral port, backed by in-memory state, so the full client stack
//! (session, cache, cart, checkout, polling) is exercised over real HTTP
//! without an external server.
//!
//! # Usage
//!
//! ```rust,ignore
//! let ctx = TestContext::signed_in("alice").await;
//! let mut cart = ctx.cart_service();
//! cart.add_item(ProductId::new(1), 2).await?;
//! ```
//!
//! The backend seeds a fixed product catalog (see [`TestBackend`]) and
//! keeps per-user carts, wishlists, orders, and profiles keyed by the
//! username a token was issued for.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use axum::extract::{Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use cartwheel_client::{
    Address, ApiClient, CartService, ClientConfig, MemoryStorage, Session, SharedStorage,
};
use cartwheel_core::{OrderId, OrderStatus};
use dashmap::DashMap;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Timestamp stamped on every seeded and created row.
const SEED_TIMESTAMP: &str = "2026-01-15T10:30:00";

/// Default number of related products when no `limit` is given.
const DEFAULT_RELATED_LIMIT: usize = 4;

// ============================================================================
// Backend State
// ============================================================================

#[derive(Debug, Clone)]
struct ProductRow {
    id: i64,
    title: &'static str,
    price: f64,
    description: &'static str,
    category: &'static str,
    image: Option<&'static str>,
    rating_rate: Option<f64>,
    rating_count: Option<u32>,
}

#[derive(Debug, Clone)]
struct ReviewRow {
    id: i64,
    product_id: i64,
    rating: u8,
    comment: &'static str,
    user_name: &'static str,
}

#[derive(Debug, Clone)]
struct CartItemRow {
    id: i64,
    product_id: i64,
    quantity: u32,
}

#[derive(Debug, Clone)]
struct WishlistItemRow {
    id: i64,
    product_id: i64,
}

#[derive(Debug, Clone)]
struct OrderItemRow {
    id: i64,
    product_id: i64,
    quantity: u32,
    price: f64,
}

#[derive(Debug, Clone)]
struct OrderRow {
    id: i64,
    total_amount: f64,
    discount_amount: f64,
    promo_code: Option<String>,
    status: OrderStatus,
    full_name: String,
    email: String,
    phone: String,
    street: String,
    city: String,
    state: String,
    zip_code: String,
    country: String,
    items: Vec<OrderItemRow>,
}

#[derive(Debug, Clone)]
struct ProfileRow {
    user_id: i64,
    username: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    phone_number: Option<String>,
    date_of_birth: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    country: Option<String>,
}

impl ProfileRow {
    fn new(user_id: i64, username: &str) -> Self {
        Self {
            user_id,
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            first_name: None,
            last_name: None,
            phone_number: None,
            date_of_birth: None,
            address: None,
            city: None,
            state: None,
            zip_code: None,
            country: None,
        }
    }
}

/// All mutable backend state. Carts, wishlists, orders, and profiles are
/// keyed by the username a token was issued for.
#[derive(Debug)]
struct BackendState {
    products: Vec<ProductRow>,
    reviews: Vec<ReviewRow>,
    tokens: DashMap<String, String>,
    carts: DashMap<String, Vec<CartItemRow>>,
    wishlists: DashMap<String, Vec<WishlistItemRow>>,
    orders: DashMap<String, Vec<OrderRow>>,
    profiles: DashMap<String, ProfileRow>,
    next_id: AtomicI64,
    order_posts: AtomicUsize,
    requests: AtomicUsize,
}

impl BackendState {
    fn seeded() -> Self {
        Self {
            products: seed_products(),
            reviews: seed_reviews(),
            tokens: DashMap::new(),
            carts: DashMap::new(),
            wishlists: DashMap::new(),
            orders: DashMap::new(),
            profiles: DashMap::new(),
            next_id: AtomicI64::new(1000),
            order_posts: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn find_product(&self, id: i64) -> Option<&ProductRow> {
        self.products.iter().find(|product| product.id == id)
    }
}

fn seed_products() -> Vec<ProductRow> {
    vec![
        ProductRow {
            id: 1,
            title: "Red Shirt",
            price: 20.0,
            description: "Soft cotton shirt in bright red",
            category: "clothing",
            image: Some("https://img.example.com/red-shirt.jpg"),
            rating_rate: Some(4.5),
            rating_count: Some(10),
        },
        ProductRow {
            id: 2,
            title: "Blue Hat",
            price: 15.0,
            description: "Wide-brim hat for sunny days",
            category: "clothing",
            image: Some("https://img.example.com/blue-hat.jpg"),
            rating_rate: Some(3.0),
            rating_count: Some(4),
        },
        ProductRow {
            id: 3,
            title: "Phone",
            price: 500.0,
            description: "Unlocked smartphone with two-day battery",
            category: "electronics",
            image: Some("https://img.example.com/phone.jpg"),
            rating_rate: Some(4.8),
            rating_count: Some(120),
        },
        ProductRow {
            id: 4,
            title: "Laptop Stand",
            price: 45.5,
            description: "Aluminium stand, folds flat",
            category: "electronics",
            image: None,
            rating_rate: None,
            rating_count: None,
        },
        ProductRow {
            id: 5,
            title: "Desk Lamp",
            price: 32.99,
            description: "Warm LED lamp with a dimmer",
            category: "home",
            image: Some("https://img.example.com/desk-lamp.jpg"),
            rating_rate: Some(4.1),
            rating_count: Some(33),
        },
        ProductRow {
            id: 6,
            title: "Green Scarf",
            price: 12.25,
            description: "Knitted scarf, fits all seasons",
            category: "clothing",
            image: None,
            rating_rate: Some(2.5),
            rating_count: Some(2),
        },
        ProductRow {
            id: 7,
            title: "USB Cable",
            price: 8.99,
            description: "Braided two-meter cable",
            category: "electronics",
            image: None,
            rating_rate: Some(4.9),
            rating_count: Some(210),
        },
        ProductRow {
            id: 8,
            title: "Ceramic Mug",
            price: 11.0,
            description: "Holds exactly one morning coffee",
            category: "home",
            image: None,
            rating_rate: None,
            rating_count: None,
        },
    ]
}

fn seed_reviews() -> Vec<ReviewRow> {
    vec![
        ReviewRow {
            id: 1,
            product_id: 1,
            rating: 5,
            comment: "Great shirt, wore it twice already",
            user_name: "alice",
        },
        ReviewRow {
            id: 2,
            product_id: 1,
            rating: 4,
            comment: "Runs a bit small",
            user_name: "bob",
        },
        ReviewRow {
            id: 3,
            product_id: 3,
            rating: 5,
            comment: "Battery really does last two days",
            user_name: "carol",
        },
    ]
}

// ============================================================================
// JSON Shapes
// ============================================================================

fn product_json(row: &ProductRow) -> Value {
    json!({
        "id": row.id,
        "title": row.title,
        "price": row.price,
        "description": row.description,
        "category": row.category,
        "image": row.image,
        "ratingRate": row.rating_rate,
        "ratingCount": row.rating_count,
    })
}

fn review_json(row: &ReviewRow) -> Value {
    json!({
        "id": row.id,
        "productId": row.product_id,
        "rating": row.rating,
        "comment": row.comment,
        "userName": row.user_name,
        "createdAt": SEED_TIMESTAMP,
    })
}

fn cart_entry_json(state: &BackendState, item: &CartItemRow) -> Value {
    let product = state
        .find_product(item.product_id)
        .map_or(Value::Null, product_json);
    json!({
        "id": item.id,
        "product": product,
        "quantity": item.quantity,
        "addedAt": SEED_TIMESTAMP,
        "updatedAt": null,
    })
}

fn order_json(state: &BackendState, row: &OrderRow) -> Value {
    let items: Vec<Value> = row
        .items
        .iter()
        .map(|item| {
            let product = state.find_product(item.product_id);
            json!({
                "id": item.id,
                "quantity": item.quantity,
                "price": item.price,
                "productTitle": product.map_or("(removed)", |p| p.title),
                "productImage": product.and_then(|p| p.image),
            })
        })
        .collect();
    json!({
        "id": row.id,
        "totalAmount": row.total_amount,
        "discountAmount": row.discount_amount,
        "promoCode": row.promo_code,
        "status": row.status,
        "orderDate": SEED_TIMESTAMP,
        "deliveryDate": null,
        "fullName": row.full_name,
        "email": row.email,
        "phone": row.phone,
        "street": row.street,
        "city": row.city,
        "state": row.state,
        "zipCode": row.zip_code,
        "country": row.country,
        "orderItems": items,
    })
}

fn profile_json(row: &ProfileRow) -> Value {
    json!({
        "id": row.user_id,
        "username": row.username,
        "email": row.email,
        "firstName": row.first_name,
        "lastName": row.last_name,
        "phoneNumber": row.phone_number,
        "profileImage": null,
        "dateOfBirth": row.date_of_birth,
        "address": row.address,
        "city": row.city,
        "state": row.state,
        "zipCode": row.zip_code,
        "country": row.country,
        "createdAt": SEED_TIMESTAMP,
        "updatedAt": null,
    })
}

// ============================================================================
// Auth
// ============================================================================

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Authentication required"})),
    )
        .into_response()
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": message}))).into_response()
}

/// Resolve the bearer token to a username, or produce the 401 response.
fn authenticate(state: &BackendState, headers: &HeaderMap) -> Result<String, Response> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| state.tokens.get(token).map(|user| user.clone()))
        .ok_or_else(unauthorized)
}

// ============================================================================
// Handlers: Products
// ============================================================================

async fn list_products(State(state): State<Arc<BackendState>>) -> Json<Value> {
    let products: Vec<Value> = state.products.iter().map(product_json).collect();
    Json(Value::Array(products))
}

async fn get_product(
    State(state): State<Arc<BackendState>>,
    Path(product_id): Path<i64>,
) -> Response {
    state.find_product(product_id).map_or_else(
        || not_found("Product not found"),
        |product| Json(product_json(product)).into_response(),
    )
}

async fn products_by_category(
    State(state): State<Arc<BackendState>>,
    Path(category): Path<String>,
) -> Json<Value> {
    let products: Vec<Value> = state
        .products
        .iter()
        .filter(|product| product.category.eq_ignore_ascii_case(&category))
        .map(product_json)
        .collect();
    Json(Value::Array(products))
}

async fn list_categories(State(state): State<Arc<BackendState>>) -> Json<Value> {
    let mut categories: Vec<&str> = Vec::new();
    for product in &state.products {
        if !categories.contains(&product.category) {
            categories.push(product.category);
        }
    }
    Json(json!(categories))
}

#[derive(Debug, Deserialize)]
struct RelatedParams {
    limit: Option<usize>,
}

async fn related_products(
    State(state): State<Arc<BackendState>>,
    Path(product_id): Path<i64>,
    Query(params): Query<RelatedParams>,
) -> Response {
    let Some(product) = state.find_product(product_id) else {
        return not_found("Product not found");
    };
    let limit = params.limit.unwrap_or(DEFAULT_RELATED_LIMIT);
    let related: Vec<Value> = state
        .products
        .iter()
        .filter(|candidate| candidate.category == product.category && candidate.id != product.id)
        .take(limit)
        .map(product_json)
        .collect();
    Json(Value::Array(related)).into_response()
}

async fn product_reviews(
    State(state): State<Arc<BackendState>>,
    Path(product_id): Path<i64>,
) -> Json<Value> {
    let reviews: Vec<Value> = state
        .reviews
        .iter()
        .filter(|review| review.product_id == product_id)
        .map(review_json)
        .collect();
    Json(Value::Array(reviews))
}

// ============================================================================
// Handlers: Promo Codes
// ============================================================================

async fn validate_promo(Path(code): Path<String>) -> Json<Value> {
    let response = match code.as_str() {
        "SAVE10" => active_promo(10.0),
        "SAVE20" => active_promo(20.0),
        "WELCOME15" => active_promo(15.0),
        "EXPIRED50" => json!({"valid": false, "message": "Promo code has expired"}),
        "SOON25" => json!({"valid": false, "message": "Promo code is not yet valid"}),
        _ => json!({"valid": false, "message": "Invalid promo code"}),
    };
    Json(response)
}

fn active_promo(percentage: f64) -> Value {
    json!({
        "valid": true,
        "message": "Promo code is valid",
        "discountPercentage": percentage,
    })
}

// ============================================================================
// Handlers: Cart
// ============================================================================

#[derive(Debug, Deserialize)]
struct CartParams {
    #[serde(rename = "productId")]
    product_id: i64,
    quantity: u32,
}

fn cart_total_quantity(items: &[CartItemRow]) -> u32 {
    items.iter().map(|item| item.quantity).sum()
}

async fn get_cart(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let items = state
        .carts
        .get(&username)
        .map(|items| items.clone())
        .unwrap_or_default();
    let entries: Vec<Value> = items
        .iter()
        .map(|item| cart_entry_json(&state, item))
        .collect();
    Json(Value::Array(entries)).into_response()
}

async fn add_to_cart(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(params): Query<CartParams>,
) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    if state.find_product(params.product_id).is_none() {
        return not_found("Product not found");
    }

    let mut items = state.carts.entry(username).or_default();
    match items
        .iter_mut()
        .find(|item| item.product_id == params.product_id)
    {
        Some(item) => item.quantity += params.quantity,
        None => {
            let id = state.next_id();
            items.push(CartItemRow {
                id,
                product_id: params.product_id,
                quantity: params.quantity,
            });
        }
    }
    let count = cart_total_quantity(&items);
    Json(json!({"message": "Product added to cart", "cartItemCount": count})).into_response()
}

async fn update_cart_item(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(params): Query<CartParams>,
) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };

    let mut items = state.carts.entry(username).or_default();
    let Some(position) = items
        .iter()
        .position(|item| item.product_id == params.product_id)
    else {
        return not_found("Cart item not found");
    };
    if params.quantity == 0 {
        items.remove(position);
    } else if let Some(item) = items.get_mut(position) {
        item.quantity = params.quantity;
    }
    let count = cart_total_quantity(&items);
    Json(json!({"message": "Cart updated", "cartItemCount": count})).into_response()
}

async fn remove_from_cart(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let mut items = state.carts.entry(username).or_default();
    items.retain(|item| item.product_id != product_id);
    let count = cart_total_quantity(&items);
    Json(json!({"message": "Product removed from cart", "cartItemCount": count})).into_response()
}

async fn clear_cart(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    state.carts.remove(&username);
    Json(json!({"message": "Cart cleared", "cartItemCount": 0})).into_response()
}

/// Anonymous callers get a zero count instead of a 401.
async fn cart_count(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Json<Value> {
    let count = authenticate(&state, &headers).map_or(0, |username| {
        state
            .carts
            .get(&username)
            .map_or(0, |items| cart_total_quantity(&items))
    });
    Json(json!({"cartItemCount": count}))
}

// ============================================================================
// Handlers: Orders
// ============================================================================

async fn place_order(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.order_posts.fetch_add(1, Ordering::Relaxed);
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };

    let items: Vec<OrderItemRow> = body
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| OrderItemRow {
                    id: state.next_id(),
                    product_id: item.get("productId").and_then(Value::as_i64).unwrap_or(0),
                    quantity: item
                        .get("quantity")
                        .and_then(Value::as_u64)
                        .and_then(|quantity| u32::try_from(quantity).ok())
                        .unwrap_or(0),
                    price: item.get("price").and_then(Value::as_f64).unwrap_or(0.0),
                })
                .collect()
        })
        .unwrap_or_default();
    if items.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Order must contain at least one item"})),
        )
            .into_response();
    }

    let text_field = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };
    let order = OrderRow {
        id: state.next_id(),
        total_amount: body
            .get("totalAmount")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        discount_amount: body
            .get("discountAmount")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        promo_code: body
            .get("promoCode")
            .and_then(Value::as_str)
            .map(str::to_owned),
        status: OrderStatus::Pending,
        full_name: text_field("fullName"),
        email: text_field("email"),
        phone: text_field("phone"),
        street: text_field("street"),
        city: text_field("city"),
        state: text_field("state"),
        zip_code: text_field("zipCode"),
        country: text_field("country"),
        items,
    };

    let response = order_json(&state, &order);
    state.orders.entry(username).or_default().push(order);
    (StatusCode::CREATED, Json(response)).into_response()
}

async fn my_orders(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let orders = state
        .orders
        .get(&username)
        .map(|orders| orders.clone())
        .unwrap_or_default();
    // Newest first.
    let list: Vec<Value> = orders
        .iter()
        .rev()
        .map(|order| order_json(&state, order))
        .collect();
    Json(Value::Array(list)).into_response()
}

async fn cancel_order(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(order_id): Path<i64>,
) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };

    let owned_by_other = state.orders.iter().any(|entry| {
        entry.key() != &username && entry.value().iter().any(|order| order.id == order_id)
    });
    if owned_by_other {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "You can only cancel your own orders"})),
        )
            .into_response();
    }

    let mut orders = state.orders.entry(username).or_default();
    let Some(order) = orders.iter_mut().find(|order| order.id == order_id) else {
        return not_found("Order not found");
    };
    if order.status != OrderStatus::Pending {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Only pending orders can be cancelled"})),
        )
            .into_response();
    }
    order.status = OrderStatus::Cancelled;
    Json(json!({"message": "Order cancelled successfully"})).into_response()
}

// ============================================================================
// Handlers: Wishlist
// ============================================================================

async fn get_wishlist(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let items = state
        .wishlists
        .get(&username)
        .map(|items| items.clone())
        .unwrap_or_default();
    let entries: Vec<Value> = items
        .iter()
        .map(|item| {
            let product = state
                .find_product(item.product_id)
                .map_or(Value::Null, product_json);
            json!({"id": item.id, "product": product, "addedAt": SEED_TIMESTAMP})
        })
        .collect();
    Json(Value::Array(entries)).into_response()
}

async fn wishlist_check(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let in_wishlist = state.wishlists.get(&username).is_some_and(|items| {
        items.iter().any(|item| item.product_id == product_id)
    });
    Json(json!({"inWishlist": in_wishlist})).into_response()
}

async fn wishlist_toggle(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    if state.find_product(product_id).is_none() {
        return not_found("Product not found");
    }

    let mut items = state.wishlists.entry(username).or_default();
    if let Some(position) = items.iter().position(|item| item.product_id == product_id) {
        items.remove(position);
        Json(json!({"inWishlist": false, "message": "Removed from wishlist"})).into_response()
    } else {
        let id = state.next_id();
        items.push(WishlistItemRow { id, product_id });
        Json(json!({"inWishlist": true, "message": "Added to wishlist"})).into_response()
    }
}

// ============================================================================
// Handlers: Profile
// ============================================================================

async fn get_profile(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    state.profiles.get(&username).map_or_else(
        || not_found("User not found"),
        |profile| Json(profile_json(&profile)).into_response(),
    )
}

async fn update_profile(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let Some(mut profile) = state.profiles.get_mut(&username) else {
        return not_found("User not found");
    };

    merge_field(&mut profile.first_name, &body, "firstName");
    merge_field(&mut profile.last_name, &body, "lastName");
    merge_field(&mut profile.phone_number, &body, "phoneNumber");
    merge_field(&mut profile.date_of_birth, &body, "dateOfBirth");
    merge_field(&mut profile.address, &body, "address");
    merge_field(&mut profile.city, &body, "city");
    merge_field(&mut profile.state, &body, "state");
    merge_field(&mut profile.zip_code, &body, "zipCode");
    merge_field(&mut profile.country, &body, "country");

    Json(profile_json(&profile)).into_response()
}

/// Absent keys leave the field unchanged, matching the real API's
/// partial-update contract.
fn merge_field(target: &mut Option<String>, body: &Value, key: &str) {
    if let Some(value) = body.get(key).and_then(Value::as_str) {
        *target = Some(value.to_owned());
    }
}

// ============================================================================
// Router & Server
// ============================================================================

async fn track_requests(
    State(state): State<Arc<BackendState>>,
    request: Request,
    next: Next,
) -> Response {
    state.requests.fetch_add(1, Ordering::Relaxed);
    next.run(request).await
}

fn router(state: Arc<BackendState>) -> Router {
    let api = Router::new()
        .route("/products", get(list_products))
        .route("/products/categories", get(list_categories))
        .route("/products/category/{category}", get(products_by_category))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}/related", get(related_products))
        .route("/reviews/product/{id}", get(product_reviews))
        .route("/promo-codes/validate/{code}", get(validate_promo))
        .route("/cart", get(get_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/update", put(update_cart_item))
        .route("/cart/remove/{product_id}", delete(remove_from_cart))
        .route("/cart/clear", delete(clear_cart))
        .route("/cart/count", get(cart_count))
        .route("/orders", post(place_order))
        .route("/orders/my-orders", get(my_orders))
        .route("/orders/{id}", delete(cancel_order))
        .route("/wishlist", get(get_wishlist))
        .route("/wishlist/check/{product_id}", get(wishlist_check))
        .route("/wishlist/toggle/{product_id}", post(wishlist_toggle))
        .route("/users/profile", get(get_profile).put(update_profile));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track_requests,
        ))
        .with_state(state)
}

/// The mock backend, listening on an ephemeral local port.
///
/// Dropping it aborts the server task.
#[derive(Debug)]
pub struct TestBackend {
    state: Arc<BackendState>,
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TestBackend {
    /// Start a freshly seeded backend.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn() -> Self {
        let state = Arc::new(BackendState::seeded());
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock backend");
        });
        Self { state, addr, task }
    }

    /// Base URL of the API, including the `/api` prefix.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Issue a bearer token for `username`, creating the account on first
    /// use.
    pub fn issue_token(&self, username: &str) -> String {
        let user_id = self.state.next_id();
        let token = format!("tok-{username}-{user_id}");
        self.state.tokens.insert(token.clone(), username.to_owned());
        self.state
            .profiles
            .entry(username.to_owned())
            .or_insert_with(|| ProfileRow::new(user_id, username));
        token
    }

    /// Invalidate a token; requests carrying it get a 401.
    pub fn revoke_token(&self, token: &str) {
        self.state.tokens.remove(token);
    }

    /// Force an order into the given status, whoever owns it.
    pub fn set_order_status(&self, order_id: OrderId, status: OrderStatus) {
        for mut entry in self.state.orders.iter_mut() {
            if let Some(order) = entry
                .value_mut()
                .iter_mut()
                .find(|order| order.id == order_id.as_i64())
            {
                order.status = status;
            }
        }
    }

    /// How many `POST /orders` requests the backend has received,
    /// including rejected ones.
    #[must_use]
    pub fn order_requests(&self) -> usize {
        self.state.order_posts.load(Ordering::Relaxed)
    }

    /// Total requests received, for asserting that a call never left the
    /// client.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::Relaxed)
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// A backend plus one client stack wired to it: in-memory storage, a
/// session, and an API client.
#[derive(Debug)]
pub struct TestContext {
    /// The mock backend.
    pub backend: TestBackend,
    /// Storage shared by the session, offline cart, and promo state.
    pub storage: SharedStorage,
    /// The client session.
    pub session: Session,
    /// API client bound to the session.
    pub api: ApiClient,
}

impl TestContext {
    /// Fresh backend with an anonymous client.
    ///
    /// # Panics
    ///
    /// Panics if the backend or client cannot be constructed.
    pub async fn new() -> Self {
        let backend = TestBackend::spawn().await;
        let storage = MemoryStorage::shared();
        let session = Session::restore(storage.clone()).expect("fresh session restores");
        let config = ClientConfig::new(backend.url().parse().expect("mock url parses"));
        let api = ApiClient::new(&config, session.clone()).expect("api client builds");
        Self {
            backend,
            storage,
            session,
            api,
        }
    }

    /// Fresh backend with a client signed in as `username`.
    ///
    /// # Panics
    ///
    /// Panics if construction or sign-in fails.
    pub async fn signed_in(username: &str) -> Self {
        let ctx = Self::new().await;
        ctx.sign_in(username);
        ctx
    }

    /// Sign the context's session in as `username`, returning the token.
    ///
    /// # Panics
    ///
    /// Panics if the session cannot be persisted.
    pub fn sign_in(&self, username: &str) -> String {
        let token = self.backend.issue_token(username);
        self.session
            .login(SecretString::from(token.clone()), None)
            .expect("login persists");
        token
    }

    /// A cart service over this context's API client and storage.
    #[must_use]
    pub fn cart_service(&self) -> CartService {
        CartService::new(self.api.clone(), self.storage.clone())
    }

    /// A second, independent signed-in client against the same backend.
    ///
    /// # Panics
    ///
    /// Panics if construction or sign-in fails.
    #[must_use]
    pub fn client_for(&self, username: &str) -> ApiClient {
        let storage = MemoryStorage::shared();
        let session = Session::restore(storage.clone()).expect("fresh session restores");
        session
            .login(SecretString::from(self.backend.issue_token(username)), None)
            .expect("login persists");
        let config = ClientConfig::new(self.backend.url().parse().expect("mock url parses"));
        ApiClient::new(&config, session).expect("api client builds")
    }
}

/// A complete shipping address for checkout tests.
#[must_use]
pub fn sample_address() -> Address {
    Address {
        full_name: "Ada Lovelace".to_owned(),
        email: "ada@example.com".to_owned(),
        phone: "555-0100".to_owned(),
        street: "1 Analytical Way".to_owned(),
        city: "London".to_owned(),
        state: "LDN".to_owned(),
        zip_code: "EC1A 1BB".to_owned(),
        country: "UK".to_owned(),
    }
}
