//! Login hand-off and logout.
//!
//! Authentication itself happens elsewhere; this service only receives the
//! signed-in user's id. At that moment the guest cart and wishlist are
//! merged into the user's backend records.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use freshcart_core::UserId;

use crate::backend::WishlistItem;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::models::CurrentShopper;
use crate::services::CartView;
use crate::state::AppState;
use crate::storage::ClientStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    pub user_id: UserId,
    pub cart: CartView,
    pub wishlist: Vec<WishlistItem>,
}

/// Hand over a signed-in user and merge the guest lists.
#[instrument(skip(state, store, form), fields(user_id = %form.user_id))]
pub async fn login(
    State(state): State<AppState>,
    store: ClientStore,
    Json(form): Json<LoginForm>,
) -> Result<Json<LoginView>> {
    if form.user_id.as_str().trim().is_empty() {
        return Err(AppError::BadRequest("userId is required".to_string()));
    }

    store.rotate_id().await?;
    store
        .set_current_shopper(&CurrentShopper {
            user_id: form.user_id.clone(),
        })
        .await?;
    set_sentry_user(&form.user_id);

    let cart = state.cart().sync(&store, &form.user_id).await?;
    let wishlist = state.wishlist().sync(&store, &form.user_id).await?;
    tracing::info!(cart = cart.len(), wishlist = wishlist.len(), "Shopper signed in");

    Ok(Json(LoginView {
        user_id: form.user_id,
        cart: CartView::new(cart, &[]),
        wishlist,
    }))
}

/// Forget the signed-in user. Guest state starts empty.
#[instrument(skip(store))]
pub async fn logout(store: ClientStore) -> Result<StatusCode> {
    store.clear_current_shopper().await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
