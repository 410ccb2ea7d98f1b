//! Cartwheel Core - Shared domain types.
//!
//! This crate provides common types used across all Cartwheel components:
//! - `client` - Storefront client library (API, cart, catalog, checkout)
//! - `cli` - Command-line front end over the client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, monetary amounts, and
//!   order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
