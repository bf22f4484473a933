//! Location-aware product listing.
//!
//! With a local warehouse (custom mode, not switched to global) the listing
//! comes from that warehouse's stock. Otherwise, or when the warehouse
//! listing is empty or fails, the public catalogue is shown.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::backend::{ProductPage, ProductQuery};
use crate::error::Result;
use crate::state::AppState;
use crate::storage::ClientStore;

/// Where a listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ListingSource {
    Warehouse,
    Public,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    pub source: ListingSource,
    #[serde(flatten)]
    pub page: ProductPage,
}

#[instrument(skip(state, store))]
pub async fn index(
    State(state): State<AppState>,
    store: ClientStore,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductListing>> {
    let location = state.location().load(&store).await?;

    if let Some(pincode) = location.as_ref().and_then(|l| l.custom_pincode()) {
        match state.backend().products_by_pincode(pincode, &query).await {
            Ok(page) if !page.products.is_empty() => {
                return Ok(Json(ProductListing {
                    source: ListingSource::Warehouse,
                    page,
                }));
            }
            Ok(_) => tracing::debug!(pincode = %pincode, "Warehouse listing empty, using public list"),
            Err(e) => tracing::warn!(error = %e, "Warehouse listing failed, using public list"),
        }
    }

    let page = state.backend().public_products(&query).await?;
    Ok(Json(ProductListing {
        source: ListingSource::Public,
        page,
    }))
}
