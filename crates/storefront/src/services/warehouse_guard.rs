//! Single-warehouse cart rule.
//!
//! A cart is fulfilled by one warehouse. Adding a product stocked by a
//! different warehouse is refused; the shopper has to empty the cart first.

use serde::Serialize;

use freshcart_core::WarehouseId;

use crate::backend::CartItem;

/// Outcome of [`can_add`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_warehouse_name: Option<String>,
}

impl AddDecision {
    const ALLOWED: Self = Self {
        allowed: true,
        conflicting_warehouse_name: None,
    };
}

/// Check whether a product from `candidate` may join `cart`.
///
/// Rejected when any existing line comes from another warehouse. The
/// conflicting warehouse's name falls back to its id when the line carries
/// no name.
#[must_use]
pub fn can_add(candidate: &WarehouseId, cart: &[CartItem]) -> AddDecision {
    cart.iter()
        .find(|item| &item.warehouse_id != candidate)
        .map_or(AddDecision::ALLOWED, |item| AddDecision {
            allowed: false,
            conflicting_warehouse_name: Some(
                item.warehouse_name
                    .clone()
                    .unwrap_or_else(|| item.warehouse_id.to_string()),
            ),
        })
}

/// Guest lines the rule would refuse against the shopper's server cart,
/// each with the name of the warehouse it clashes with.
///
/// The login merge keeps such lines; this only reports them.
#[must_use]
pub fn conflicting_lines<'a>(
    guest: &'a [CartItem],
    server: &[CartItem],
) -> Vec<(&'a CartItem, String)> {
    guest
        .iter()
        .filter_map(|line| {
            can_add(&line.warehouse_id, server)
                .conflicting_warehouse_name
                .map(|name| (line, name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use freshcart_core::ProductId;

    use super::*;

    fn line(warehouse: &str, name: Option<&str>) -> CartItem {
        CartItem {
            id: ProductId::new("P1"),
            variant_id: None,
            variant_name: None,
            selected_variant: None,
            quantity: 1,
            price: Decimal::from(10),
            warehouse_id: WarehouseId::new(warehouse),
            warehouse_name: name.map(str::to_string),
            name: None,
        }
    }

    #[test]
    fn test_empty_cart_allows_anything() {
        assert_eq!(can_add(&WarehouseId::new("W1"), &[]), AddDecision::ALLOWED);
    }

    #[test]
    fn test_same_warehouse_allowed() {
        let cart = [line("W1", Some("HSR")), line("W1", Some("HSR"))];
        assert!(can_add(&WarehouseId::new("W1"), &cart).allowed);
    }

    #[test]
    fn test_different_warehouse_rejected_with_name() {
        let cart = [line("W1", Some("HSR Layout"))];
        let decision = can_add(&WarehouseId::new("W2"), &cart);
        assert!(!decision.allowed);
        assert_eq!(
            decision.conflicting_warehouse_name.as_deref(),
            Some("HSR Layout")
        );
    }

    #[test]
    fn test_any_mismatch_rejects_regardless_of_count() {
        let mut cart: Vec<CartItem> = (0..10).map(|_| line("W2", None)).collect();
        cart.push(line("W1", Some("Whitefield")));

        let decision = can_add(&WarehouseId::new("W2"), &cart);
        assert!(!decision.allowed);
        assert_eq!(
            decision.conflicting_warehouse_name.as_deref(),
            Some("Whitefield")
        );
    }

    #[test]
    fn test_name_falls_back_to_id() {
        let decision = can_add(&WarehouseId::new("W2"), &[line("W1", None)]);
        assert_eq!(decision.conflicting_warehouse_name.as_deref(), Some("W1"));
    }

    #[test]
    fn test_conflicting_guest_lines_are_reported() {
        let server = [line("W1", Some("HSR"))];
        let guest = [line("W1", None), line("W2", Some("Indiranagar"))];

        let conflicts = conflicting_lines(&guest, &server);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].0.warehouse_id, WarehouseId::new("W2"));
        assert_eq!(conflicts[0].1, "HSR");

        assert!(conflicting_lines(&guest, &[]).is_empty());
    }
}
