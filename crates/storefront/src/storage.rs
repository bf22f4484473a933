//! Per-visitor client storage.
//!
//! A thin typed layer over the visitor's [`Session`]. It plays the role the
//! browser's local storage played for the web client: guest carts and
//! wishlists, the saved location, and one-shot UI flags.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;
use uuid::Uuid;

use crate::backend::{CartItem, WishlistItem};
use crate::models::{CurrentShopper, LocationState, session_keys};

/// Errors reading or writing client storage.
pub type StorageError = tower_sessions::session::Error;

/// Typed access to one visitor's stored state.
#[derive(Clone, Debug)]
pub struct ClientStore {
    session: Session,
}

impl ClientStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.session.get::<T>(key).await
    }

    async fn save<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.session.insert(key, value).await
    }

    async fn clear(&self, key: &str) -> Result<(), StorageError> {
        self.session.remove_value(key).await.map(|_| ())
    }

    async fn flag(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.load::<bool>(key).await?.unwrap_or(false))
    }

    // =========================================================================
    // Location
    // =========================================================================

    /// The saved location, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn location(&self) -> Result<Option<LocationState>, StorageError> {
        self.load(session_keys::LOCATION_STATE).await
    }

    /// Persist the location.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save_location(&self, state: &LocationState) -> Result<(), StorageError> {
        self.save(session_keys::LOCATION_STATE, state).await
    }

    /// Forget the saved location and its revalidation mark.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear_location(&self) -> Result<(), StorageError> {
        self.clear(session_keys::LOCATION_STATE).await?;
        self.clear(session_keys::LOCATION_REVALIDATED).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn location_revalidated(&self) -> Result<bool, StorageError> {
        self.flag(session_keys::LOCATION_REVALIDATED).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn mark_location_revalidated(&self) -> Result<(), StorageError> {
        self.save(session_keys::LOCATION_REVALIDATED, &true).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn has_attempted_auto_detection(&self) -> Result<bool, StorageError> {
        self.flag(session_keys::HAS_ATTEMPTED_AUTO_DETECTION).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn mark_auto_detection_attempted(&self) -> Result<(), StorageError> {
        self.save(session_keys::HAS_ATTEMPTED_AUTO_DETECTION, &true)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn has_dismissed_location_modal(&self) -> Result<bool, StorageError> {
        self.flag(session_keys::HAS_MANUALLY_DISMISSED_LOCATION_MODAL)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn mark_location_modal_dismissed(&self) -> Result<(), StorageError> {
        self.save(session_keys::HAS_MANUALLY_DISMISSED_LOCATION_MODAL, &true)
            .await
    }

    // =========================================================================
    // Guest cart & wishlist
    // =========================================================================

    /// The guest cart (empty when nothing is stored).
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn cart_items(&self) -> Result<Vec<CartItem>, StorageError> {
        Ok(self
            .load(session_keys::CART_ITEMS)
            .await?
            .unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save_cart_items(&self, items: &[CartItem]) -> Result<(), StorageError> {
        self.save(session_keys::CART_ITEMS, &items).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear_cart_items(&self) -> Result<(), StorageError> {
        self.clear(session_keys::CART_ITEMS).await
    }

    /// The guest wishlist (empty when nothing is stored).
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn wishlist_items(&self) -> Result<Vec<WishlistItem>, StorageError> {
        Ok(self
            .load(session_keys::WISHLIST_ITEMS)
            .await?
            .unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save_wishlist_items(&self, items: &[WishlistItem]) -> Result<(), StorageError> {
        self.save(session_keys::WISHLIST_ITEMS, &items).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear_wishlist_items(&self) -> Result<(), StorageError> {
        self.clear(session_keys::WISHLIST_ITEMS).await
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn current_shopper(&self) -> Result<Option<CurrentShopper>, StorageError> {
        self.load(session_keys::CURRENT_SHOPPER).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_current_shopper(&self, shopper: &CurrentShopper) -> Result<(), StorageError> {
        self.save(session_keys::CURRENT_SHOPPER, shopper).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear_current_shopper(&self) -> Result<(), StorageError> {
        self.clear(session_keys::CURRENT_SHOPPER).await
    }

    /// Issue a new session id, keeping the stored data.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn rotate_id(&self) -> Result<(), StorageError> {
        self.session.cycle_id().await
    }

    /// Write the session to its store now.
    ///
    /// Only needed for changes made after the response has been sent; the
    /// session layer saves everything else.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn persist(&self) -> Result<(), StorageError> {
        self.session.save().await
    }

    /// Stable id for this visitor, created on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn visitor_id(&self) -> Result<String, StorageError> {
        if let Some(id) = self.load::<String>(session_keys::VISITOR_ID).await? {
            return Ok(id);
        }
        let id = Uuid::new_v4().to_string();
        self.save(session_keys::VISITOR_ID, &id).await?;
        Ok(id)
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use freshcart_core::{ProductId, WarehouseId};

    use super::test_support::memory_store;
    use super::*;

    #[tokio::test]
    async fn test_flags_default_to_false_and_stick() {
        let store = memory_store();
        assert!(!store.has_attempted_auto_detection().await.unwrap());
        store.mark_auto_detection_attempted().await.unwrap();
        assert!(store.has_attempted_auto_detection().await.unwrap());
        assert!(!store.has_dismissed_location_modal().await.unwrap());
    }

    #[tokio::test]
    async fn test_cart_items_save_and_clear() {
        let store = memory_store();
        assert!(store.cart_items().await.unwrap().is_empty());

        let item = CartItem {
            id: ProductId::new("P1"),
            variant_id: None,
            variant_name: None,
            selected_variant: None,
            quantity: 2,
            price: Decimal::from(30),
            warehouse_id: WarehouseId::new("W1"),
            warehouse_name: None,
            name: None,
        };
        store.save_cart_items(&[item.clone()]).await.unwrap();
        assert_eq!(store.cart_items().await.unwrap(), vec![item]);

        store.clear_cart_items().await.unwrap();
        assert!(store.cart_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_location_resets_revalidation() {
        let store = memory_store();
        store
            .save_location(&LocationState {
                saved_at: Utc::now(),
                ..LocationState::default()
            })
            .await
            .unwrap();
        store.mark_location_revalidated().await.unwrap();

        store.clear_location().await.unwrap();
        assert!(store.location().await.unwrap().is_none());
        assert!(!store.location_revalidated().await.unwrap());
    }

    #[tokio::test]
    async fn test_visitor_id_is_stable() {
        let store = memory_store();
        let first = store.visitor_id().await.unwrap();
        let second = store.visitor_id().await.unwrap();
        assert_eq!(first, second);
    }
}
