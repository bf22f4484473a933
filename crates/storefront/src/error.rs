//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response goes out; clients get a JSON body
//! `{"error": "..."}` that never carries internal details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::services::{CartError, CheckoutError, LocationError, WishlistError};
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend request failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Storage(#[from] StorageError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Wishlist error: {0}")]
    Wishlist(#[from] WishlistError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Cart(e) => Self::Cart(e),
            CheckoutError::Location(e) => Self::Location(e),
        }
    }
}

/// Status and client-facing message for a failure.
type Outcome = (StatusCode, String);

const INTERNAL: &str = "Internal server error";

fn backend_outcome(err: &BackendError) -> Outcome {
    (StatusCode::BAD_GATEWAY, err.user_message())
}

fn storage_outcome() -> Outcome {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
}

impl AppError {
    fn outcome(&self) -> Outcome {
        match self {
            Self::Backend(e) => backend_outcome(e),
            Self::Storage(_) => storage_outcome(),
            Self::Location(e) => match e {
                LocationError::InvalidPincode(_) | LocationError::InvalidCoordinates => {
                    (StatusCode::BAD_REQUEST, e.to_string())
                }
                LocationError::DetectionTimedOut => (StatusCode::GATEWAY_TIMEOUT, e.to_string()),
                LocationError::NoLocalDelivery => (StatusCode::CONFLICT, e.to_string()),
                LocationError::Backend(inner) => backend_outcome(inner),
                LocationError::Storage(_) => storage_outcome(),
            },
            Self::Cart(e) => match e {
                CartError::VariantRequired
                | CartError::InvalidQuantity
                | CartError::InvalidPrice => {
                    (StatusCode::BAD_REQUEST, e.to_string())
                }
                CartError::WarehouseConflict(_) | CartError::AlreadyInFlight => {
                    (StatusCode::CONFLICT, e.to_string())
                }
                CartError::NotInCart => (StatusCode::NOT_FOUND, e.to_string()),
                CartError::Backend(inner) => backend_outcome(inner),
                CartError::Storage(_) => storage_outcome(),
            },
            Self::Wishlist(e) => match e {
                WishlistError::AlreadyListed(_) | WishlistError::AlreadyInFlight => {
                    (StatusCode::CONFLICT, e.to_string())
                }
                WishlistError::Backend(inner) => backend_outcome(inner),
                WishlistError::Storage(_) => storage_outcome(),
            },
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.outcome();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after the login hand-off to associate errors with the shopper.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "P1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use freshcart_core::PincodeError;

    use super::*;

    fn status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("userId is required".to_string());
        assert_eq!(err.to_string(), "Bad request: userId is required");
        assert_eq!(
            err.outcome(),
            (StatusCode::BAD_REQUEST, "userId is required".to_string())
        );
    }

    #[test]
    fn test_validation_errors_are_bad_request() {
        assert_eq!(
            status(LocationError::InvalidPincode(PincodeError::NonDigit)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(CartError::VariantRequired), StatusCode::BAD_REQUEST);
        assert_eq!(status(CartError::InvalidPrice), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_business_conflicts_are_conflict() {
        assert_eq!(
            status(CartError::WarehouseConflict("HSR".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(status(CartError::AlreadyInFlight), StatusCode::CONFLICT);
        assert_eq!(
            status(WishlistError::AlreadyListed("P1 (red)".to_string())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_backend_errors_are_bad_gateway() {
        let err = BackendError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(status(err), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status(CartError::Backend(BackendError::RateLimited(3))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let (code, message) = AppError::Internal("db password wrong".to_string()).outcome();
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }
}
