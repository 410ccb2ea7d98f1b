//! Cartwheel Client - headless storefront client library.
//!
//! Everything a storefront front end needs short of rendering: a typed REST
//! API client, cart and pricing engines, promo-code handling, catalog
//! filtering/sorting/pagination, checkout, session state, and an
//! order-status poller.
//!
//! # Architecture
//!
//! - The remote REST API is the source of truth for products, the signed-in
//!   cart, orders, wishlist, and profile data - no local database
//! - [`cart::OfflineCart`] holds the anonymous shopper's cart in client-side
//!   storage; it is an explicit offline cache, pushed to the server through
//!   [`cart::CartService::reconcile`] after sign-in, never a parallel
//!   implementation
//! - Monetary math uses [`cartwheel_core::Money`] (exact decimals, rounded
//!   to cents only at display and order submission)
//! - Auth state lives in an injected [`session::Session`]; login, logout,
//!   and token rejection are observable through a watch channel
//! - Catalog reads are cached in-memory via `moka` (5 minute TTL)
//!
//! # Modules
//!
//! - [`api`] - REST client for the storefront backend
//! - [`cart`] - cart model, pricing, offline cache, server-authoritative ops
//! - [`catalog`] - filter/sort/paginate engine and search debouncing
//! - [`checkout`] - address validation and order placement
//! - [`orders`] - order-status polling
//! - [`session`] / [`storage`] - auth state and durable client-side state
//! - [`config`] - environment-based configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod orders;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use cart::{AppliedPromo, Cart, CartError, CartLine, CartService, OfflineCart};
pub use catalog::{Catalog, CatalogPage, CatalogView, FilterState, PriceRange, SortKey};
pub use checkout::{Address, CheckoutError, CheckoutService};
pub use config::{ClientConfig, ConfigError};
pub use orders::{OrderStatusPoller, PollerHandle};
pub use session::{AccountSummary, Session};
pub use storage::{FileStorage, MemoryStorage, SharedStorage, Storage, StorageError};
