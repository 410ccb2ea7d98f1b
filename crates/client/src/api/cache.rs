//! Cache types for catalog API responses.

use crate::api::types::Product;

/// Cached value types.
///
/// Only catalog reads are cached. Cart, order, wishlist and profile
/// responses are per-user mutable state and always hit the network.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Categories(Vec<String>),
}
