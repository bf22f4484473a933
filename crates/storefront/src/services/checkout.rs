//! Checkout readiness.
//!
//! Puts the cart, the saved location and a fresh delivery quote together
//! and says whether the shopper may proceed to payment.

use serde::Serialize;
use tracing::instrument;

use freshcart_core::{Money, PaymentMethod};

use super::cart::{CartError, CartService, subtotal};
use super::delivery::{DELIVERY_NOT_AVAILABLE, DeliveryInfo, DeliveryService};
use super::location::{LocationError, LocationResolver};
use crate::backend::CartItem;
use crate::models::Coordinates;
use crate::storage::ClientStore;

/// Why checkout is blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum CheckoutBlocker {
    EmptyCart,
    /// The local warehouse is switched off for this pincode.
    DeliveryPaused { message: String },
    /// No position to quote delivery against.
    LocationRequired,
    DeliveryUnavailable { title: String, message: String },
}

/// Everything the checkout page needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub items: Vec<CartItem>,
    pub subtotal: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryInfo>,
    pub delivery_charge: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub can_checkout: bool,
    pub blockers: Vec<CheckoutBlocker>,
}

/// Errors assembling the summary. Backend trouble never lands here; it
/// shows up as a blocker instead.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Location(#[from] LocationError),
}

#[derive(Clone)]
pub struct CheckoutService {
    cart: CartService,
    location: LocationResolver,
    delivery: DeliveryService,
}

impl CheckoutService {
    #[must_use]
    pub const fn new(cart: CartService, location: LocationResolver, delivery: DeliveryService) -> Self {
        Self {
            cart,
            location,
            delivery,
        }
    }

    /// Build the checkout summary for the visitor.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session store fails.
    #[instrument(skip(self, store))]
    pub async fn summary(
        &self,
        store: &ClientStore,
        position: Option<Coordinates>,
        payment_method: PaymentMethod,
    ) -> Result<CheckoutSummary, CheckoutError> {
        let items = self.cart.items(store).await?;
        let location = self.location.load(store).await?;
        let subtotal = subtotal(&items);

        let mut blockers = Vec::new();
        if items.is_empty() {
            blockers.push(CheckoutBlocker::EmptyCart);
        }
        if let Some(state) = location.as_ref().filter(|state| state.is_disabled()) {
            blockers.push(CheckoutBlocker::DeliveryPaused {
                message: state.delivery_message.clone(),
            });
        }

        let delivery = match position {
            Some(position) if !items.is_empty() => Some(
                self.delivery
                    .calculate(position, subtotal, payment_method)
                    .await,
            ),
            Some(_) => None,
            None => {
                blockers.push(CheckoutBlocker::LocationRequired);
                None
            }
        };

        if let Some(info) = delivery.as_ref().filter(|info| !info.available) {
            blockers.push(CheckoutBlocker::DeliveryUnavailable {
                title: DELIVERY_NOT_AVAILABLE.to_string(),
                message: info.message.clone().unwrap_or_default(),
            });
        }

        Ok(assemble(items, subtotal, delivery, payment_method, blockers))
    }
}

fn assemble(
    items: Vec<CartItem>,
    subtotal: Money,
    delivery: Option<DeliveryInfo>,
    payment_method: PaymentMethod,
    blockers: Vec<CheckoutBlocker>,
) -> CheckoutSummary {
    let delivery_charge = delivery
        .as_ref()
        .filter(|info| info.available)
        .map_or(Money::ZERO, |info| info.total_delivery_charge);

    CheckoutSummary {
        items,
        subtotal,
        delivery,
        delivery_charge,
        total: subtotal.saturating_add(delivery_charge),
        payment_method,
        can_checkout: blockers.is_empty(),
        blockers,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use freshcart_core::{ProductId, WarehouseId};

    use super::*;

    fn line() -> CartItem {
        CartItem {
            id: ProductId::new("P1"),
            variant_id: None,
            variant_name: None,
            selected_variant: None,
            quantity: 2,
            price: Decimal::from(100),
            warehouse_id: WarehouseId::new("W1"),
            warehouse_name: None,
            name: None,
        }
    }

    #[test]
    fn test_unavailable_delivery_adds_no_charge() {
        let summary = assemble(
            vec![line()],
            Decimal::from(200),
            Some(DeliveryInfo::unavailable("Maximum delivery distance exceeded")),
            PaymentMethod::Online,
            vec![CheckoutBlocker::DeliveryUnavailable {
                title: DELIVERY_NOT_AVAILABLE.to_string(),
                message: "Maximum delivery distance exceeded".to_string(),
            }],
        );

        assert!(!summary.can_checkout);
        assert_eq!(summary.total, Decimal::from(200));
        assert_eq!(summary.delivery_charge, Money::ZERO);
    }

    #[test]
    fn test_blocker_wire_shape() {
        let json = serde_json::to_value(CheckoutBlocker::DeliveryUnavailable {
            title: DELIVERY_NOT_AVAILABLE.to_string(),
            message: "Out of range".to_string(),
        })
        .unwrap();

        assert_eq!(json["reason"], "deliveryUnavailable");
        assert_eq!(json["title"], "Delivery Not Available");
        assert_eq!(json["message"], "Out of range");
    }
}
