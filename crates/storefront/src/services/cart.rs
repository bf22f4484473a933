//! Cart operations for guests and signed-in shoppers.
//!
//! Guests keep their cart in the session. Signed-in shoppers' carts live in
//! the backend; the guest cart is merged into it once at login ([`CartService::sync`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use freshcart_core::{ItemKey, Money, UserId, is_valid_unit_price};

use super::inflight::{InFlightGuard, InFlightRequests};
use super::reconcile;
use super::warehouse_guard;
use crate::backend::{BackendClient, BackendError, CartItem, ListResource};
use crate::storage::{ClientStore, StorageError};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Please select a variant before adding this product")]
    VariantRequired,

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Price must be between 0 and 10000000")]
    InvalidPrice,

    #[error("Your cart has items from {0}. Clear your cart to shop from another store.")]
    WarehouseConflict(String),

    #[error("This item is already being updated")]
    AlreadyInFlight,

    #[error("Item is not in the cart")]
    NotInCart,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Body of an add-to-cart request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    #[serde(flatten)]
    pub item: CartItem,
    /// The product declares variants, so one must be chosen.
    #[serde(default)]
    pub has_variants: bool,
}

/// Cart contents with derived totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub subtotal: Money,
    /// UI keys of lines with a request still running.
    pub pending: Vec<String>,
}

impl CartView {
    #[must_use]
    pub fn new(items: Vec<CartItem>, pending: &[ItemKey]) -> Self {
        Self {
            item_count: items.iter().fold(0_u32, |n, i| n.saturating_add(i.quantity)),
            subtotal: subtotal(&items),
            pending: pending.iter().map(ItemKey::ui_key).collect(),
            items,
        }
    }
}

/// Sum of line totals, saturating at `Money::MAX`.
#[must_use]
pub fn subtotal(items: &[CartItem]) -> Money {
    items
        .iter()
        .map(CartItem::line_total)
        .fold(Money::ZERO, Money::saturating_add)
}

/// Cart service.
#[derive(Clone)]
pub struct CartService {
    backend: BackendClient,
    inflight: InFlightRequests,
}

impl CartService {
    #[must_use]
    pub fn new(backend: BackendClient) -> Self {
        Self {
            backend,
            inflight: InFlightRequests::new(),
        }
    }

    /// Keys with an add/update/remove running for this visitor.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn pending(&self, store: &ClientStore) -> Result<Vec<ItemKey>, CartError> {
        let visitor = store.visitor_id().await?;
        Ok(self.inflight.pending_for(&visitor))
    }

    /// The visitor's cart.
    ///
    /// A backend failure degrades to an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip(self, store))]
    pub async fn items(&self, store: &ClientStore) -> Result<Vec<CartItem>, CartError> {
        match store.current_shopper().await? {
            Some(shopper) => Ok(self
                .backend
                .get_list(ListResource::Cart, &shopper.user_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to load cart, showing empty cart");
                    Vec::new()
                })),
            None => Ok(store.cart_items().await?),
        }
    }

    /// Add a product to the cart.
    ///
    /// Checked in order: variant selection, in-flight duplicate, then the
    /// single-warehouse rule against the current cart. Adding a key that is
    /// already in a guest cart increases its quantity.
    ///
    /// # Errors
    ///
    /// Returns `VariantRequired`, `InvalidQuantity`, `InvalidPrice`,
    /// `AlreadyInFlight` or
    /// `WarehouseConflict` without contacting the backend for the write, or
    /// the backend error if the add fails.
    #[instrument(skip(self, store, request), fields(key = %request.item.key()))]
    pub async fn add(
        &self,
        store: &ClientStore,
        request: AddToCart,
    ) -> Result<Vec<CartItem>, CartError> {
        let AddToCart { item, has_variants } = request;
        if has_variants && item.variant_id.is_none() {
            return Err(CartError::VariantRequired);
        }
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if !is_valid_unit_price(item.price) {
            return Err(CartError::InvalidPrice);
        }

        let _guard = self.begin(store, &item.key()).await?;

        match store.current_shopper().await? {
            Some(shopper) => {
                let current: Vec<CartItem> = self
                    .backend
                    .get_list(ListResource::Cart, &shopper.user_id)
                    .await?;
                check_warehouse(&item, &current)?;
                Ok(self
                    .backend
                    .add_list_item(ListResource::Cart, &shopper.user_id, &item)
                    .await?)
            }
            None => {
                let mut items = store.cart_items().await?;
                check_warehouse(&item, &items)?;

                let key = item.key();
                match items.iter_mut().find(|line| line.key() == key) {
                    Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
                    None => items.push(item),
                }
                store.save_cart_items(&items).await?;
                Ok(items)
            }
        }
    }

    /// Set the quantity of a line; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `NotInCart` for an unknown guest line, `AlreadyInFlight` for
    /// a concurrent change, or the backend error.
    #[instrument(skip(self, store), fields(key = %key))]
    pub async fn update_quantity(
        &self,
        store: &ClientStore,
        key: &ItemKey,
        quantity: u32,
    ) -> Result<Vec<CartItem>, CartError> {
        let _guard = self.begin(store, key).await?;

        if quantity == 0 {
            return self.remove_unguarded(store, key).await;
        }

        match store.current_shopper().await? {
            Some(shopper) => Ok(self
                .backend
                .update_cart_quantity(&shopper.user_id, key, quantity)
                .await?),
            None => {
                let mut items = store.cart_items().await?;
                let line = items
                    .iter_mut()
                    .find(|line| &line.key() == key)
                    .ok_or(CartError::NotInCart)?;
                line.quantity = quantity;
                store.save_cart_items(&items).await?;
                Ok(items)
            }
        }
    }

    /// Remove a line.
    ///
    /// For signed-in shoppers a 404 from the backend counts as removed, and
    /// the cart is refetched either way. Removing an absent guest line is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInFlight` for a concurrent change, or the backend
    /// error.
    #[instrument(skip(self, store), fields(key = %key))]
    pub async fn remove(
        &self,
        store: &ClientStore,
        key: &ItemKey,
    ) -> Result<Vec<CartItem>, CartError> {
        let _guard = self.begin(store, key).await?;
        self.remove_unguarded(store, key).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or session store fails.
    #[instrument(skip(self, store))]
    pub async fn clear(&self, store: &ClientStore) -> Result<(), CartError> {
        match store.current_shopper().await? {
            Some(shopper) => {
                self.backend
                    .replace_list::<CartItem>(ListResource::Cart, &shopper.user_id, &[])
                    .await?;
            }
            None => store.clear_cart_items().await?,
        }
        Ok(())
    }

    /// Merge the guest cart into a shopper's backend cart.
    ///
    /// On success the guest cart is cleared and the merged cart returned. If
    /// writing back fails the guest cart is kept for a later attempt and the
    /// server cart as fetched (or nothing) is returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session store fails.
    #[instrument(skip(self, store), fields(user_id = %user_id))]
    pub async fn sync(
        &self,
        store: &ClientStore,
        user_id: &UserId,
    ) -> Result<Vec<CartItem>, CartError> {
        let local = store.cart_items().await?;

        let server: Vec<CartItem> = match self.backend.get_list(ListResource::Cart, user_id).await
        {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch cart for merge, keeping guest cart");
                return Ok(Vec::new());
            }
        };

        if local.is_empty() {
            return Ok(server);
        }

        for (line, server_warehouse) in warehouse_guard::conflicting_lines(&local, &server) {
            tracing::warn!(
                product_id = %line.id,
                guest_warehouse = %line.warehouse_id,
                server_warehouse = %server_warehouse,
                "Merged cart spans two warehouses"
            );
        }

        let merged = reconcile::merge(&local, &server);
        match self
            .backend
            .replace_list(ListResource::Cart, user_id, &merged)
            .await
        {
            Ok(saved) => {
                store.clear_cart_items().await?;
                tracing::info!(
                    local = local.len(),
                    server = server.len(),
                    merged = saved.len(),
                    "Merged guest cart"
                );
                Ok(saved)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save merged cart, keeping guest cart");
                Ok(server)
            }
        }
    }

    async fn begin(&self, store: &ClientStore, key: &ItemKey) -> Result<InFlightGuard, CartError> {
        let visitor = store.visitor_id().await?;
        self.inflight
            .try_begin(&visitor, key)
            .ok_or(CartError::AlreadyInFlight)
    }

    async fn remove_unguarded(
        &self,
        store: &ClientStore,
        key: &ItemKey,
    ) -> Result<Vec<CartItem>, CartError> {
        match store.current_shopper().await? {
            Some(shopper) => {
                match self
                    .backend
                    .remove_list_item(ListResource::Cart, &shopper.user_id, key)
                    .await
                {
                    Ok(()) => {}
                    Err(BackendError::NotFound(_)) => {
                        tracing::debug!(key = %key, "Cart line already gone");
                    }
                    Err(e) => return Err(e.into()),
                }
                Ok(self
                    .backend
                    .get_list(ListResource::Cart, &shopper.user_id)
                    .await?)
            }
            None => {
                let mut items = store.cart_items().await?;
                items.retain(|line| &line.key() != key);
                store.save_cart_items(&items).await?;
                Ok(items)
            }
        }
    }
}

fn check_warehouse(item: &CartItem, cart: &[CartItem]) -> Result<(), CartError> {
    let decision = warehouse_guard::can_add(&item.warehouse_id, cart);
    if decision.allowed {
        return Ok(());
    }
    Err(CartError::WarehouseConflict(
        decision.conflicting_warehouse_name.unwrap_or_default(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use freshcart_core::{ProductId, VariantId, WarehouseId};

    use super::*;
    use crate::config::BackendConfig;
    use crate::storage::test_support::memory_store;

    fn service() -> CartService {
        // Guest paths never reach the backend.
        CartService::new(BackendClient::new(&BackendConfig::for_url("http://127.0.0.1:9")).unwrap())
    }

    fn item(id: &str, variant: Option<&str>, quantity: u32, warehouse: &str) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            variant_id: variant.map(VariantId::new),
            variant_name: None,
            selected_variant: None,
            quantity,
            price: Decimal::new(2550, 2),
            warehouse_id: WarehouseId::new(warehouse),
            warehouse_name: Some(format!("{warehouse} store")),
            name: None,
        }
    }

    fn add(item: CartItem) -> AddToCart {
        AddToCart {
            item,
            has_variants: false,
        }
    }

    #[tokio::test]
    async fn test_guest_add_accumulates_same_key() {
        let store = memory_store();
        let cart = service();

        cart.add(&store, add(item("P1", None, 1, "W1"))).await.unwrap();
        let items = cart.add(&store, add(item("P1", None, 2, "W1"))).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(store.cart_items().await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_variant_required_when_product_declares_variants() {
        let store = memory_store();
        let err = service()
            .add(
                &store,
                AddToCart {
                    item: item("P1", None, 1, "W1"),
                    has_variants: true,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::VariantRequired));
        assert!(store.cart_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_price_is_rejected() {
        let store = memory_store();
        let cart = service();

        for price in [Decimal::new(-100, 2), Decimal::MAX] {
            let mut line = item("P1", None, 2, "W1");
            line.price = price;
            let err = cart.add(&store, add(line)).await.unwrap_err();
            assert!(matches!(err, CartError::InvalidPrice), "{price}");
        }
        assert!(store.cart_items().await.unwrap().is_empty());
    }

    #[test]
    fn test_subtotal_saturates() {
        let mut huge = item("P1", None, 2, "W1");
        huge.price = Decimal::MAX;
        let view = CartView::new(vec![huge, item("P2", None, 1, "W1")], &[]);
        assert_eq!(view.subtotal, Decimal::MAX);
    }

    #[tokio::test]
    async fn test_other_warehouse_is_rejected() {
        let store = memory_store();
        let cart = service();
        cart.add(&store, add(item("P1", None, 1, "W1"))).await.unwrap();

        let err = cart
            .add(&store, add(item("P2", None, 1, "W2")))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::WarehouseConflict(name) if name == "W1 store"));
        assert_eq!(store.cart_items().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_in_flight_key_is_rejected() {
        let store = memory_store();
        let cart = service();
        let key = ItemKey::new(ProductId::new("P1"), None);

        let _held = cart.begin(&store, &key).await.unwrap();
        let err = cart
            .add(&store, add(item("P1", None, 1, "W1")))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::AlreadyInFlight));
        assert_eq!(cart.pending(&store).await.unwrap(), vec![key]);
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_line() {
        let store = memory_store();
        let cart = service();
        cart.add(&store, add(item("P1", Some("1kg"), 2, "W1")))
            .await
            .unwrap();

        let key = ItemKey::new(ProductId::new("P1"), Some(VariantId::new("1kg")));
        let items = cart.update_quantity(&store, &key, 0).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_guest_line() {
        let store = memory_store();
        let key = ItemKey::new(ProductId::new("P9"), None);
        let err = service().update_quantity(&store, &key, 2).await.unwrap_err();
        assert!(matches!(err, CartError::NotInCart));
    }

    #[test]
    fn test_view_totals() {
        let view = CartView::new(
            vec![item("P1", None, 2, "W1"), item("P2", None, 1, "W1")],
            &[],
        );
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, Decimal::new(7650, 2));
    }
}
