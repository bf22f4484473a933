//! Wishlist operations.
//!
//! Same storage split as the cart: session for guests, backend for
//! signed-in shoppers. Each `(product, variant)` pair appears at most once.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use freshcart_core::{ItemKey, ProductId, UserId, VariantId};

use super::inflight::{InFlightGuard, InFlightRequests};
use super::reconcile;
use crate::backend::{BackendClient, BackendError, ListResource, WishlistItem};
use crate::storage::{ClientStore, StorageError};

/// Errors from wishlist operations.
#[derive(Debug, Error)]
pub enum WishlistError {
    #[error("{0} is already in your wishlist")]
    AlreadyListed(String),

    #[error("This item is already being updated")]
    AlreadyInFlight,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Body of an add-to-wishlist request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToWishlist {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub variant_name: Option<String>,
    #[serde(default)]
    pub selected_variant: Option<serde_json::Value>,
}

impl AddToWishlist {
    fn into_item(self) -> WishlistItem {
        WishlistItem {
            product_id: self.product_id,
            variant_id: self.variant_id,
            variant_name: self.variant_name,
            selected_variant: self.selected_variant,
            added_at: Utc::now(),
        }
    }
}

/// Heart button state for one product card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistStatus {
    pub listed: bool,
    /// A change for this entry is still running; the button stays disabled.
    pub pending: bool,
}

#[derive(Clone)]
pub struct WishlistService {
    backend: BackendClient,
    inflight: InFlightRequests,
}

impl WishlistService {
    #[must_use]
    pub fn new(backend: BackendClient) -> Self {
        Self {
            backend,
            inflight: InFlightRequests::new(),
        }
    }

    /// The visitor's wishlist. A backend failure degrades to empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip(self, store))]
    pub async fn items(&self, store: &ClientStore) -> Result<Vec<WishlistItem>, WishlistError> {
        match store.current_shopper().await? {
            Some(shopper) => Ok(self
                .backend
                .get_list(ListResource::Wishlist, &shopper.user_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to load wishlist");
                    Vec::new()
                })),
            None => Ok(store.wishlist_items().await?),
        }
    }

    /// Listed and busy flags for a single entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip(self, store))]
    pub async fn status(
        &self,
        store: &ClientStore,
        key: &ItemKey,
    ) -> Result<WishlistStatus, WishlistError> {
        let visitor = store.visitor_id().await?;
        let pending = self.inflight.is_pending(&visitor, key);
        let listed = self
            .items(store)
            .await?
            .iter()
            .any(|entry| &entry.key() == key);
        Ok(WishlistStatus { listed, pending })
    }

    /// Add an entry.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyListed` when the same product and variant is already
    /// present, `AlreadyInFlight` for a concurrent change, or the backend
    /// error.
    #[instrument(skip(self, store, request), fields(product_id = %request.product_id))]
    pub async fn add(
        &self,
        store: &ClientStore,
        request: AddToWishlist,
    ) -> Result<Vec<WishlistItem>, WishlistError> {
        let item = request.into_item();
        let key = item.key();
        let _guard = self.begin(store, &key).await?;

        match store.current_shopper().await? {
            Some(shopper) => {
                let current: Vec<WishlistItem> = self
                    .backend
                    .get_list(ListResource::Wishlist, &shopper.user_id)
                    .await?;
                ensure_absent(&key, &current)?;
                Ok(self
                    .backend
                    .add_list_item(ListResource::Wishlist, &shopper.user_id, &item)
                    .await?)
            }
            None => {
                let mut items = store.wishlist_items().await?;
                ensure_absent(&key, &items)?;
                items.push(item);
                store.save_wishlist_items(&items).await?;
                Ok(items)
            }
        }
    }

    /// Remove an entry; a 404 from the backend counts as removed.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInFlight` for a concurrent change, or the backend
    /// error.
    #[instrument(skip(self, store))]
    pub async fn remove(
        &self,
        store: &ClientStore,
        key: &ItemKey,
    ) -> Result<Vec<WishlistItem>, WishlistError> {
        let _guard = self.begin(store, key).await?;

        match store.current_shopper().await? {
            Some(shopper) => {
                if let Err(e) = self
                    .backend
                    .remove_list_item(ListResource::Wishlist, &shopper.user_id, key)
                    .await
                {
                    if !matches!(e, BackendError::NotFound(_)) {
                        return Err(e.into());
                    }
                    tracing::debug!("Wishlist entry already gone");
                }
                Ok(self
                    .backend
                    .get_list(ListResource::Wishlist, &shopper.user_id)
                    .await?)
            }
            None => {
                let mut items = store.wishlist_items().await?;
                items.retain(|entry| &entry.key() != key);
                store.save_wishlist_items(&items).await?;
                Ok(items)
            }
        }
    }

    /// Merge the guest wishlist into a shopper's backend wishlist.
    ///
    /// Same failure behaviour as the cart merge: the guest list survives a
    /// failed write and the server list as fetched is returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session store fails.
    #[instrument(skip(self, store), fields(user_id = %user_id))]
    pub async fn sync(
        &self,
        store: &ClientStore,
        user_id: &UserId,
    ) -> Result<Vec<WishlistItem>, WishlistError> {
        let local = store.wishlist_items().await?;
        let server: Vec<WishlistItem> =
            match self.backend.get_list(ListResource::Wishlist, user_id).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to fetch wishlist for merge");
                    return Ok(Vec::new());
                }
            };

        if local.is_empty() {
            return Ok(server);
        }

        let merged = reconcile::merge(&local, &server);
        match self
            .backend
            .replace_list(ListResource::Wishlist, user_id, &merged)
            .await
        {
            Ok(saved) => {
                store.clear_wishlist_items().await?;
                Ok(saved)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save merged wishlist");
                Ok(server)
            }
        }
    }

    async fn begin(
        &self,
        store: &ClientStore,
        key: &ItemKey,
    ) -> Result<InFlightGuard, WishlistError> {
        let visitor = store.visitor_id().await?;
        self.inflight
            .try_begin(&visitor, key)
            .ok_or(WishlistError::AlreadyInFlight)
    }
}

fn ensure_absent(key: &ItemKey, items: &[WishlistItem]) -> Result<(), WishlistError> {
    if items.iter().any(|entry| &entry.key() == key) {
        return Err(WishlistError::AlreadyListed(key.to_string()));
    }
    Ok(())
}
