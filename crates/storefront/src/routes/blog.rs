//! Blog listing proxies.

use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use crate::backend::{BlogPage, BlogQuery};
use crate::error::Result;
use crate::state::AppState;

/// A page of published posts.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<BlogQuery>,
) -> Result<Json<BlogPage>> {
    Ok(Json(state.backend().published_blogs(&query).await?))
}

/// All categories (cached).
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.backend().blog_categories().await?))
}
