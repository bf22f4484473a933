//! HTTP route handlers for the storefront API.
//!
//! All bodies are JSON. Errors are `{"error": "..."}` with 400 for
//! validation, 409 for business conflicts, 502 for backend failures.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness check
//!
//! # Location
//! GET    /api/location                - Saved location (revalidated when due)
//! POST   /api/location/pincode        - Apply a typed pincode
//! POST   /api/location/detect         - Detect from device position
//! POST   /api/location/mode           - Toggle global fulfilment
//! POST   /api/location/dismiss        - Visitor closed the location modal
//! DELETE /api/location                - Forget the location
//!
//! # Delivery
//! POST   /api/delivery/quote          - Delivery charge for position and cart
//!
//! # Cart
//! GET    /api/cart                    - Cart with totals
//! POST   /api/cart/items              - Add a product
//! PATCH  /api/cart/items              - Change quantity (0 removes)
//! DELETE /api/cart/items              - Remove a line (?productId&variantId)
//! DELETE /api/cart                    - Empty the cart
//!
//! # Wishlist
//! GET    /api/wishlist                - Wishlist entries
//! POST   /api/wishlist/items          - Add an entry
//! DELETE /api/wishlist/items          - Remove an entry (?productId&variantId)
//!
//! # Session
//! POST   /api/session/login           - Login hand-off, merges guest lists
//! POST   /api/session/logout          - Forget the shopper
//!
//! # Promotions & checkout
//! GET    /api/promocodes/suggestions  - Codes for the current cart
//! GET    /api/checkout/summary        - Totals and checkout blockers
//!
//! # Catalogue
//! GET    /api/blogs                   - Published posts
//! GET    /api/blogs/categories        - Blog categories
//! GET    /api/products                - Location-aware product listing
//! ```

pub mod blog;
pub mod cart;
pub mod checkout;
pub mod delivery;
pub mod location;
pub mod products;
pub mod promocodes;
pub mod session;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the location routes router.
pub fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(location::show).delete(location::clear))
        .route("/pincode", post(location::set_pincode))
        .route("/detect", post(location::detect))
        .route("/mode", post(location::set_mode))
        .route("/dismiss", post(location::dismiss))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route(
            "/items",
            post(cart::add).patch(cart::update).delete(cart::remove),
        )
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/items", post(wishlist::add).delete(wishlist::remove))
        .route("/status", get(wishlist::status))
}

/// Create the session routes router.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(session::login))
        .route("/logout", post(session::logout))
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::index))
        .route("/categories", get(blog::categories))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/location", location_routes())
        .route("/api/delivery/quote", post(delivery::quote))
        .nest("/api/cart", cart_routes())
        .nest("/api/wishlist", wishlist_routes())
        .nest("/api/session", session_routes())
        .route(
            "/api/promocodes/suggestions",
            get(promocodes::suggestions),
        )
        .route("/api/checkout/summary", get(checkout::summary))
        .nest("/api/blogs", blog_routes())
        .route("/api/products", get(products::index))
}
