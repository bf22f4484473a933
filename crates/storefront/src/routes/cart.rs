//! Cart route handlers.
//!
//! Every mutation answers with the full cart so the UI can re-render from
//! one response.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use freshcart_core::{ItemKey, ProductId, VariantId};

use crate::backend::CartItem;
use crate::error::{Result, add_breadcrumb};
use crate::services::{AddToCart, CartView};
use crate::state::AppState;
use crate::storage::ClientStore;

/// Body of a quantity change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

impl QuantityForm {
    fn key(&self) -> ItemKey {
        ItemKey::new(self.product_id.clone(), self.variant_id.clone())
    }
}

async fn view(state: &AppState, store: &ClientStore, items: Vec<CartItem>) -> Result<Json<CartView>> {
    let pending = state.cart().pending(store).await?;
    Ok(Json(CartView::new(items, &pending)))
}

/// Current cart.
#[instrument(skip(state, store))]
pub async fn show(State(state): State<AppState>, store: ClientStore) -> Result<Json<CartView>> {
    let items = state.cart().items(&store).await?;
    view(&state, &store, items).await
}

/// Add a product.
#[instrument(skip(state, store, request))]
pub async fn add(
    State(state): State<AppState>,
    store: ClientStore,
    Json(request): Json<AddToCart>,
) -> Result<Json<CartView>> {
    let product_id = request.item.id.to_string();
    let items = state.cart().add(&store, request).await?;
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    view(&state, &store, items).await
}

/// Change a line's quantity; zero removes it.
#[instrument(skip(state, store))]
pub async fn update(
    State(state): State<AppState>,
    store: ClientStore,
    Json(form): Json<QuantityForm>,
) -> Result<Json<CartView>> {
    let items = state
        .cart()
        .update_quantity(&store, &form.key(), form.quantity)
        .await?;
    view(&state, &store, items).await
}

/// Remove a line, identified by `?productId=..&variantId=..`.
#[instrument(skip(state, store))]
pub async fn remove(
    State(state): State<AppState>,
    store: ClientStore,
    Query(key): Query<ItemKey>,
) -> Result<Json<CartView>> {
    let items = state.cart().remove(&store, &key).await?;
    view(&state, &store, items).await
}

/// Empty the cart.
#[instrument(skip(state, store))]
pub async fn clear(State(state): State<AppState>, store: ClientStore) -> Result<StatusCode> {
    state.cart().clear(&store).await?;
    Ok(StatusCode::NO_CONTENT)
}
