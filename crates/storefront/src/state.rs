//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{BackendClient, BackendError};
use crate::config::StorefrontConfig;
use crate::services::{
    CartService, CheckoutService, DeliveryService, DetectionTracker, LocationResolver,
    PromoCodeService, WishlistService,
};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Every service is built once here and
/// injected; nothing is reached through globals.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    location: LocationResolver,
    detections: DetectionTracker,
    delivery: DeliveryService,
    cart: CartService,
    wishlist: WishlistService,
    promocodes: PromoCodeService,
    checkout: CheckoutService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built from the
    /// configuration.
    pub fn new(config: StorefrontConfig) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend)?;

        let location = LocationResolver::new(backend.clone(), config.location);
        let delivery = DeliveryService::new(backend.clone());
        let cart = CartService::new(backend.clone());
        let checkout = CheckoutService::new(cart.clone(), location.clone(), delivery.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                wishlist: WishlistService::new(backend.clone()),
                promocodes: PromoCodeService::new(backend.clone()),
                detections: DetectionTracker::new(),
                config,
                backend,
                location,
                delivery,
                cart,
                checkout,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn location(&self) -> &LocationResolver {
        &self.inner.location
    }

    #[must_use]
    pub fn detections(&self) -> &DetectionTracker {
        &self.inner.detections
    }

    #[must_use]
    pub fn delivery(&self) -> &DeliveryService {
        &self.inner.delivery
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistService {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn promocodes(&self) -> &PromoCodeService {
        &self.inner.promocodes
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
