//! Login-time reconciliation of guest lists into the signed-in record.
//!
//! A visitor may fill a cart or wishlist before signing in. At login the
//! guest list is merged into the backend list exactly once:
//!
//! - entries are matched by [`ItemKey`] (product id + variant id, exact
//!   string equality, absent variant is its own key)
//! - a matching cart line gets the guest quantity **added** to the server
//!   quantity; quantities accrued while signed out are never lost
//! - unmatched guest entries are appended with their variant details intact
//! - the result never holds two entries with the same key
//!
//! Stock is not re-validated here; the backend decides what it accepts when
//! the merged list is written back.

use std::collections::HashMap;

use freshcart_core::ItemKey;

use crate::backend::{CartItem, WishlistItem};

/// An entry that can be reconciled by key.
pub trait Keyed: Clone {
    fn item_key(&self) -> ItemKey;

    /// Fold a duplicate (same key) into `self`.
    fn absorb(&mut self, other: &Self);
}

impl Keyed for CartItem {
    fn item_key(&self) -> ItemKey {
        self.key()
    }

    fn absorb(&mut self, other: &Self) {
        self.quantity = self.quantity.saturating_add(other.quantity);
    }
}

impl Keyed for WishlistItem {
    fn item_key(&self) -> ItemKey {
        self.key()
    }

    /// Wishlist entries carry no quantity; the existing entry wins.
    fn absorb(&mut self, _other: &Self) {}
}

/// Merge a guest list into a server list.
///
/// Order is preserved: server entries first in server order, then new guest
/// entries in guest order.
#[must_use]
pub fn merge<T: Keyed>(local: &[T], server: &[T]) -> Vec<T> {
    let mut merged: Vec<T> = Vec::with_capacity(server.len() + local.len());
    let mut positions: HashMap<ItemKey, usize> = HashMap::with_capacity(merged.capacity());

    for item in server.iter().chain(local) {
        let key = item.item_key();
        match positions.get(&key) {
            Some(&index) => {
                if let Some(existing) = merged.get_mut(index) {
                    existing.absorb(item);
                }
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(item.clone());
            }
        }
    }

    merged
}
