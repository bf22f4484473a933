//! Session-related types.

use serde::{Deserialize, Serialize};

use freshcart_core::UserId;

/// Session-stored shopper identity.
///
/// Set when the authentication layer hands over a signed-in user; carts
/// and wishlists are read from the backend while this is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentShopper {
    /// Backend user id.
    pub user_id: UserId,
}

/// Session keys. Names match the storage keys used by the web client.
pub mod keys {
    /// Saved [`LocationState`](crate::models::LocationState).
    pub const LOCATION_STATE: &str = "locationState";

    /// Guest wishlist, merged into the backend record at login.
    pub const WISHLIST_ITEMS: &str = "wishlistItems";

    /// Guest cart, merged into the backend record at login.
    pub const CART_ITEMS: &str = "cartItems";

    /// Set once automatic location detection has been tried.
    pub const HAS_ATTEMPTED_AUTO_DETECTION: &str = "hasAttemptedAutoDetection";

    /// Set when the visitor closes the location modal themselves.
    pub const HAS_MANUALLY_DISMISSED_LOCATION_MODAL: &str = "hasManuallyDismissedLocationModal";

    /// Set once the saved pincode has been revalidated in this session.
    pub const LOCATION_REVALIDATED: &str = "locationRevalidated";

    /// The signed-in shopper, if any.
    pub const CURRENT_SHOPPER: &str = "currentShopper";

    /// Stable per-visitor id used to scope in-flight request tracking.
    pub const VISITOR_ID: &str = "visitorId";
}
