//! Client for the grocery REST backend.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - The backend is the source of truth for products, promocodes, delivery
//!   pricing and signed-in carts/wishlists; nothing is synced locally
//! - In-memory caching via `moka` for slow-changing listings (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use freshcart_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//!
//! // Check whether a pincode is served by a local warehouse
//! let check = client.check_pincode(&pincode).await?;
//!
//! // Load a signed-in shopper's cart
//! let items = client.get_list::<CartItem>(ListResource::Cart, &user_id).await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::{BackendClient, ListResource};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the grocery backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the `error`/`message` field, or the raw body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The configured base URL cannot carry path segments.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Message suitable for showing to a shopper.
    ///
    /// Backend validation messages are passed through; transport failures are
    /// collapsed into a generic retry hint.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } | Self::NotFound(message) => message.clone(),
            Self::RateLimited(_) => "Too many requests, please try again shortly".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::InvalidUrl(_) => {
                "Could not reach the store, please try again".to_string()
            }
        }
    }
}

/// Extract a human-readable message from an error body.
///
/// The backend uses `{ "error": "..." }` for most failures and
/// `{ "message": "..." }` for validation failures.
pub(crate) fn extract_error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(200).collect())
}
