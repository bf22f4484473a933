//! Duplicate-click protection for cart and wishlist mutations.
//!
//! Each visitor may have at most one outstanding add/remove per item key.
//! A second request for the same key while the first is still running is
//! turned away instead of being sent to the backend again.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use freshcart_core::ItemKey;

type Slot = (String, ItemKey);

/// Set of (visitor, item) pairs with a request in progress.
#[derive(Clone, Default, Debug)]
pub struct InFlightRequests {
    inner: Arc<Mutex<HashSet<Slot>>>,
}

/// Held while a request runs; releases the slot on drop.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the guard is dropped"]
pub struct InFlightGuard {
    set: Arc<Mutex<HashSet<Slot>>>,
    slot: Option<Slot>,
}

impl InFlightRequests {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `key`, or `None` if a request for it is running.
    pub fn try_begin(&self, visitor: &str, key: &ItemKey) -> Option<InFlightGuard> {
        let slot = (visitor.to_string(), key.clone());
        let mut set = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(slot.clone()) {
            return None;
        }
        Some(InFlightGuard {
            set: Arc::clone(&self.inner),
            slot: Some(slot),
        })
    }

    /// Whether a request for `key` is running (drives the disabled button).
    #[must_use]
    pub fn is_pending(&self, visitor: &str, key: &ItemKey) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(visitor.to_string(), key.clone()))
    }

    /// Keys with a running request for one visitor.
    #[must_use]
    pub fn pending_for(&self, visitor: &str) -> Vec<ItemKey> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(owner, _)| owner == visitor)
            .map(|(_, key)| key.clone())
            .collect()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.set
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&slot);
        }
    }
}
