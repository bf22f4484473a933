//! Delivery charge quotes.
//!
//! A pure adapter over `POST /delivery/calculate`: distance, radius and
//! free-delivery rules live in the backend. One request per quote, no
//! retries, no caching, no local fallback computation.

use serde::Serialize;
use tracing::instrument;

use freshcart_core::{Money, PaymentMethod};

use crate::backend::{
    BackendClient, BackendError, DeliveryQuote, DeliveryQuoteRequest, WarehouseSummary,
};
use crate::models::Coordinates;

/// Headline shown when the backend refuses a delivery.
pub const DELIVERY_NOT_AVAILABLE: &str = "Delivery Not Available";

/// Delivery terms for the current cart and position. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    pub available: bool,
    pub warehouse: Option<WarehouseSummary>,
    pub distance: Option<f64>,
    pub delivery_charge: Money,
    pub total_delivery_charge: Money,
    pub is_free_delivery: bool,
    pub free_delivery_eligible: bool,
    pub amount_needed_for_free_delivery: Money,
    /// Why delivery is unavailable, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DeliveryInfo {
    /// Unavailable delivery with a shopper-facing reason.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            warehouse: None,
            distance: None,
            delivery_charge: Money::ZERO,
            total_delivery_charge: Money::ZERO,
            is_free_delivery: false,
            free_delivery_eligible: false,
            amount_needed_for_free_delivery: Money::ZERO,
            message: Some(message.into()),
        }
    }
}

/// Fallback reason when the backend refuses without saying why.
const UNAVAILABLE_REASON: &str = "Delivery is not available for this location";

impl From<DeliveryQuote> for DeliveryInfo {
    fn from(quote: DeliveryQuote) -> Self {
        if !quote.available {
            return Self::unavailable(
                quote
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| UNAVAILABLE_REASON.to_string()),
            );
        }
        Self {
            available: true,
            warehouse: quote.warehouse,
            distance: quote.distance,
            delivery_charge: quote.delivery_charge,
            total_delivery_charge: quote.total_delivery_charge,
            is_free_delivery: quote.is_free_delivery,
            free_delivery_eligible: quote.free_delivery_eligible,
            amount_needed_for_free_delivery: quote.amount_needed_for_free_delivery,
            message: None,
        }
    }
}

/// Quotes delivery charges through the backend.
#[derive(Clone)]
pub struct DeliveryService {
    backend: BackendClient,
}

impl DeliveryService {
    #[must_use]
    pub const fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Quote delivery for a cart.
    ///
    /// Any failure, including transport errors, becomes an unavailable
    /// quote carrying the reason.
    #[instrument(skip(self))]
    pub async fn calculate(
        &self,
        position: Coordinates,
        cart_total: Money,
        payment_method: PaymentMethod,
    ) -> DeliveryInfo {
        if !position.is_valid() {
            return DeliveryInfo::unavailable("Invalid delivery location");
        }

        let request = DeliveryQuoteRequest {
            customer_lat: position.lat,
            customer_lng: position.lng,
            cart_total,
            payment_method,
        };

        match self.backend.calculate_delivery(&request).await {
            Ok(quote) => DeliveryInfo::from(quote),
            Err(e) => {
                tracing::warn!(error = %e, "Delivery quote failed");
                DeliveryInfo::unavailable(failure_message(&e))
            }
        }
    }
}

fn failure_message(error: &BackendError) -> String {
    match error {
        BackendError::Api { message, .. } | BackendError::NotFound(message) => message.clone(),
        other => other.user_message(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use freshcart_core::WarehouseId;

    use super::*;

    #[test]
    fn test_quote_maps_one_to_one() {
        let quote = DeliveryQuote {
            available: true,
            error: None,
            warehouse: Some(WarehouseSummary {
                id: WarehouseId::new("W1"),
                name: "Andheri".to_string(),
            }),
            distance: Some(3.4),
            delivery_charge: Decimal::from(25),
            total_delivery_charge: Decimal::from(35),
            is_free_delivery: false,
            free_delivery_eligible: true,
            amount_needed_for_free_delivery: Decimal::from(120),
            warehouse_settings: None,
        };

        let info = DeliveryInfo::from(quote);
        assert!(info.available);
        assert_eq!(info.distance, Some(3.4));
        assert_eq!(info.total_delivery_charge, Decimal::from(35));
        assert_eq!(info.amount_needed_for_free_delivery, Decimal::from(120));
        assert!(info.free_delivery_eligible);
        assert!(info.message.is_none());
    }

    #[test]
    fn test_refusal_in_success_body_is_unavailable() {
        let quote: DeliveryQuote = serde_json::from_value(serde_json::json!({
            "available": false,
            "error": "Maximum delivery distance exceeded",
            "deliveryCharge": 40,
        }))
        .unwrap();

        let info = DeliveryInfo::from(quote);
        assert!(!info.available);
        assert_eq!(info.total_delivery_charge, Money::ZERO);
        assert_eq!(info.message.as_deref(), Some("Maximum delivery distance exceeded"));
    }

    #[test]
    fn test_refusal_without_reason_gets_fallback() {
        let quote: DeliveryQuote =
            serde_json::from_value(serde_json::json!({ "available": false })).unwrap();
        assert_eq!(
            DeliveryInfo::from(quote).message.as_deref(),
            Some(UNAVAILABLE_REASON)
        );
    }

    #[test]
    fn test_quote_without_flag_is_available() {
        let quote: DeliveryQuote =
            serde_json::from_value(serde_json::json!({ "deliveryCharge": 25 })).unwrap();
        assert!(DeliveryInfo::from(quote).available);
    }

    #[test]
    fn test_backend_error_message_is_surfaced() {
        let err = BackendError::Api {
            status: 400,
            message: "Maximum delivery distance exceeded".to_string(),
        };
        assert_eq!(failure_message(&err), "Maximum delivery distance exceeded");
    }

    #[test]
    fn test_not_found_message_is_surfaced() {
        let err = BackendError::NotFound("No warehouse serves this area".to_string());
        assert_eq!(failure_message(&err), "No warehouse serves this area");
    }
}
