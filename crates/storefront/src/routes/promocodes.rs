//! Promocode suggestions handler.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::OptionalShopper;
use crate::services::{PromoSuggestions, cart::subtotal};
use crate::state::AppState;

/// Suggestions for the current cart. Empty when the cart is.
#[instrument(skip_all)]
pub async fn suggestions(
    State(state): State<AppState>,
    OptionalShopper { store, shopper }: OptionalShopper,
) -> Result<Json<PromoSuggestions>> {
    let items = state.cart().items(&store).await?;
    let user_id = shopper.as_ref().map(|s| &s.user_id);

    let suggestions = state
        .promocodes()
        .suggestions(subtotal(&items), user_id, &items)
        .await;
    Ok(Json(suggestions))
}
