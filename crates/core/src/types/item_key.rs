//! Composite key identifying a cart line or wishlist entry.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::id::{ProductId, VariantId};

/// Identity of a cart or wishlist entry: the product plus the selected variant.
///
/// An absent variant is a key value of its own, distinct from every
/// present variant. Both components compare with exact string equality.
///
/// ```
/// use freshcart_core::{ItemKey, ProductId, VariantId};
///
/// let plain = ItemKey::new(ProductId::new("P1"), None);
/// let red = ItemKey::new(ProductId::new("P1"), Some(VariantId::new("red")));
/// assert_ne!(plain, red);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemKey {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
}

impl ItemKey {
    #[must_use]
    pub const fn new(product_id: ProductId, variant_id: Option<VariantId>) -> Self {
        Self {
            product_id,
            variant_id,
        }
    }

    /// Stable string key for list rendering.
    ///
    /// Components are length-prefixed so ids containing the separator can
    /// never collide (`("a_b", None)` vs `("a", Some("b"))`).
    #[must_use]
    pub fn ui_key(&self) -> String {
        match &self.variant_id {
            Some(variant) => format!(
                "{}:{}|{}:{}",
                self.product_id.as_str().len(),
                self.product_id,
                variant.as_str().len(),
                variant
            ),
            None => format!("{}:{}|-", self.product_id.as_str().len(), self.product_id),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant_id {
            Some(variant) => write!(f, "{} ({variant})", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn key(product: &str, variant: Option<&str>) -> ItemKey {
        ItemKey::new(ProductId::new(product), variant.map(VariantId::new))
    }

    #[test]
    fn test_absent_variant_is_its_own_key() {
        assert_ne!(key("P1", None), key("P1", Some("")));
        assert_ne!(key("P1", None), key("P1", Some("red")));
        assert_eq!(key("P1", None), key("P1", None));
    }

    #[test]
    fn test_ui_keys_distinct_for_variants() {
        let red = key("P1", Some("red"));
        let blue = key("P1", Some("blue"));
        assert_ne!(red.ui_key(), blue.ui_key());
    }

    #[test]
    fn test_ui_keys_do_not_collide_on_separators() {
        let keys = [
            key("a_b", None),
            key("a", Some("b")),
            key("a_", Some("b")),
            key("a", Some("_b")),
            key("a:1|b", None),
            key("a", Some("1|b")),
        ];
        let rendered: HashSet<String> = keys.iter().map(ItemKey::ui_key).collect();
        assert_eq!(rendered.len(), keys.len());
    }

    #[test]
    fn test_serde_camel_case() {
        let json = serde_json::to_value(key("P1", Some("red"))).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({"productId": "P1", "variantId": "red"}))
        );
    }
}
