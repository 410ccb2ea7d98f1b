//! Error type for the storefront REST API.

use thiserror::Error;

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The operation needs a signed-in account and no token is held,
    /// or the server rejected the token we sent.
    #[error("authentication required")]
    AuthRequired,

    /// HTTP request failed (connection, timeout, malformed URL).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the server.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response. `message` is the server's
    /// `{"error": ...}` body when present, otherwise the raw body.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided error message.
        message: String,
    },
}

impl ApiError {
    /// True when the error means the caller should sign in (again).
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }
}
