//! `freshcart delivery quote`.

use rust_decimal::Decimal;

use freshcart_core::{PaymentMethod, display_amount};
use freshcart_storefront::backend::BackendClient;
use freshcart_storefront::models::Coordinates;
use freshcart_storefront::services::{DELIVERY_NOT_AVAILABLE, DeliveryService};

use super::{CommandError, emit};

/// Quote delivery the way the checkout page does.
///
/// An unavailable delivery is printed, not treated as a failure.
///
/// # Errors
///
/// Returns an error only if the output cannot be encoded.
pub async fn quote(
    backend: &BackendClient,
    lat: f64,
    lng: f64,
    total: Decimal,
    payment: PaymentMethod,
) -> Result<(), CommandError> {
    let info = DeliveryService::new(backend.clone())
        .calculate(Coordinates { lat, lng }, total, payment)
        .await;

    if info.available {
        tracing::info!(
            charge = %display_amount(info.total_delivery_charge),
            free = info.is_free_delivery,
            "Delivery available"
        );
    } else {
        tracing::warn!(
            reason = info.message.as_deref().unwrap_or_default(),
            "{DELIVERY_NOT_AVAILABLE}"
        );
    }
    emit(&info)
}
