//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use freshcart_core::ItemKey;

use crate::backend::{ItemsEnvelope, WishlistItem};
use crate::error::Result;
use crate::services::{AddToWishlist, WishlistStatus};
use crate::state::AppState;
use crate::storage::ClientStore;

type WishlistView = Json<ItemsEnvelope<WishlistItem>>;

const fn envelope(items: Vec<WishlistItem>) -> WishlistView {
    Json(ItemsEnvelope { items })
}

#[instrument(skip(state, store))]
pub async fn show(State(state): State<AppState>, store: ClientStore) -> Result<WishlistView> {
    Ok(envelope(state.wishlist().items(&store).await?))
}

/// Heart button state for `?productId=..&variantId=..`.
#[instrument(skip(state, store))]
pub async fn status(
    State(state): State<AppState>,
    store: ClientStore,
    Query(key): Query<ItemKey>,
) -> Result<Json<WishlistStatus>> {
    Ok(Json(state.wishlist().status(&store, &key).await?))
}

/// Add an entry. The same product with another variant is a separate entry.
#[instrument(skip(state, store, request))]
pub async fn add(
    State(state): State<AppState>,
    store: ClientStore,
    Json(request): Json<AddToWishlist>,
) -> Result<WishlistView> {
    Ok(envelope(state.wishlist().add(&store, request).await?))
}

/// Remove an entry, identified by `?productId=..&variantId=..`.
#[instrument(skip(state, store))]
pub async fn remove(
    State(state): State<AppState>,
    store: ClientStore,
    Query(key): Query<ItemKey>,
) -> Result<WishlistView> {
    Ok(envelope(state.wishlist().remove(&store, &key).await?))
}
