//! Storefront services.
//!
//! Each service is constructed once at startup, cloned into [`AppState`]
//! and handed a [`ClientStore`] per request.
//!
//! [`AppState`]: crate::state::AppState
//! [`ClientStore`]: crate::storage::ClientStore

pub mod cart;
pub mod checkout;
pub mod delivery;
pub mod inflight;
pub mod location;
pub mod promocodes;
pub mod reconcile;
pub mod warehouse_guard;
pub mod wishlist;

pub use cart::{AddToCart, CartError, CartService, CartView};
pub use checkout::{CheckoutBlocker, CheckoutError, CheckoutService, CheckoutSummary};
pub use delivery::{DELIVERY_NOT_AVAILABLE, DeliveryInfo, DeliveryService};
pub use inflight::{InFlightGuard, InFlightRequests};
pub use location::{DetectionPhase, DetectionTracker, LocationError, LocationResolver};
pub use promocodes::{PromoCodeService, PromoSuggestions};
pub use wishlist::{AddToWishlist, WishlistError, WishlistService, WishlistStatus};
