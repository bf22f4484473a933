//! Per-request visitor extractors.
//!
//! [`ClientStore`] can be taken directly as a handler argument; it wraps the
//! session installed by the session layer. [`OptionalShopper`] additionally
//! reads the signed-in shopper, if any.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::models::CurrentShopper;
use crate::storage::ClientStore;

/// Rejection when the session layer is missing or the store fails.
#[derive(Debug)]
pub struct SessionUnavailable;

impl IntoResponse for SessionUnavailable {
    fn into_response(self) -> Response {
        tracing::error!("Session not available for request");
        (StatusCode::INTERNAL_SERVER_ERROR, "Session unavailable").into_response()
    }
}

impl<S> FromRequestParts<S> for ClientStore
where
    S: Send + Sync,
{
    type Rejection = SessionUnavailable;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self::new)
            .ok_or(SessionUnavailable)
    }
}

/// The signed-in shopper, if any, alongside their store.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalShopper { store, shopper }: OptionalShopper) -> impl IntoResponse {
///     shopper.map(|s| s.user_id.to_string()).unwrap_or_default()
/// }
/// ```
pub struct OptionalShopper {
    pub store: ClientStore,
    pub shopper: Option<CurrentShopper>,
}

impl<S> FromRequestParts<S> for OptionalShopper
where
    S: Send + Sync,
{
    type Rejection = SessionUnavailable;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = ClientStore::from_request_parts(parts, state).await?;
        let shopper = store.current_shopper().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read shopper from session");
            SessionUnavailable
        })?;

        if let Some(shopper) = &shopper {
            tracing::Span::current().record("user_id", shopper.user_id.as_str());
        }

        Ok(Self { store, shopper })
    }
}
