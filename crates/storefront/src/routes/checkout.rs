//! Checkout summary handler.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use freshcart_core::PaymentMethod;

use crate::error::Result;
use crate::models::Coordinates;
use crate::services::CheckoutSummary;
use crate::state::AppState;
use crate::storage::ClientStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl SummaryQuery {
    const fn position(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }
}

/// Whether the shopper can proceed, and what is in the way if not.
#[instrument(skip(state, store))]
pub async fn summary(
    State(state): State<AppState>,
    store: ClientStore,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<CheckoutSummary>> {
    let summary = state
        .checkout()
        .summary(&store, query.position(), query.payment_method)
        .await?;

    if !summary.can_checkout {
        tracing::info!(blockers = summary.blockers.len(), "Checkout blocked");
    }
    Ok(Json(summary))
}
