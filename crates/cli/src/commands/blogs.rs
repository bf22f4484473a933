//! `freshcart blogs list`.

use freshcart_storefront::backend::{BackendClient, BlogQuery};

use super::{CommandError, emit};

/// Print a page of published posts.
///
/// # Errors
///
/// Returns an error if the backend request fails.
pub async fn list(backend: &BackendClient, query: &BlogQuery) -> Result<(), CommandError> {
    let page = backend.published_blogs(query).await?;
    tracing::info!(
        posts = page.blogs.len(),
        page = page.current_page,
        total_pages = page.total_pages,
        "Fetched blog posts"
    );
    emit(&page)
}
