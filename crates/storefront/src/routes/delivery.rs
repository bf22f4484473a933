//! Delivery quote handler.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use freshcart_core::{Money, PaymentMethod};

use crate::error::Result;
use crate::models::Coordinates;
use crate::services::{DELIVERY_NOT_AVAILABLE, DeliveryInfo, cart::subtotal};
use crate::state::AppState;
use crate::storage::ClientStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteForm {
    #[serde(flatten)]
    pub position: Coordinates,
    /// Defaults to the current cart subtotal.
    #[serde(default)]
    pub cart_total: Option<Money>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    #[serde(flatten)]
    pub delivery: DeliveryInfo,
    /// Headline for an unavailable delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'static str>,
}

/// Quote delivery for a position and cart total.
///
/// Always 200: an unavailable delivery is a result, not an error.
#[instrument(skip(state, store))]
pub async fn quote(
    State(state): State<AppState>,
    store: ClientStore,
    Json(form): Json<QuoteForm>,
) -> Result<Json<QuoteView>> {
    let cart_total = match form.cart_total {
        Some(total) => total,
        None => subtotal(&state.cart().items(&store).await?),
    };

    let delivery = state
        .delivery()
        .calculate(form.position, cart_total, form.payment_method)
        .await;

    Ok(Json(QuoteView {
        title: (!delivery.available).then_some(DELIVERY_NOT_AVAILABLE),
        delivery,
    }))
}
