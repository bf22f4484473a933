//! `freshcart promos suggest`.

use chrono::Utc;
use rust_decimal::Decimal;

use freshcart_core::{ProductId, UserId, WarehouseId, display_amount};
use freshcart_storefront::backend::{BackendClient, CartItem};
use freshcart_storefront::services::cart::subtotal;
use freshcart_storefront::services::promocodes;

use super::{CommandError, emit};

/// Parse `product:quantity:price` into a cart line.
fn parse_item(raw: &str) -> Result<CartItem, CommandError> {
    let invalid = || CommandError::Invalid(format!("expected product:quantity:price, got {raw:?}"));

    let mut parts = raw.rsplitn(3, ':');
    let price: Decimal = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let quantity: u32 = parts.next().and_then(|q| q.parse().ok()).ok_or_else(invalid)?;
    let product = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;

    Ok(CartItem {
        id: ProductId::new(product),
        variant_id: None,
        variant_name: None,
        selected_variant: None,
        quantity,
        price,
        warehouse_id: WarehouseId::new("cli"),
        warehouse_name: None,
        name: None,
    })
}

/// Print the suggestions the cart page would show for these lines.
///
/// Unlike the storefront, a backend failure is reported rather than
/// swallowed.
///
/// # Errors
///
/// Returns an error for a malformed item or a backend failure.
pub async fn suggest(
    backend: &BackendClient,
    items: &[String],
    user: Option<String>,
) -> Result<(), CommandError> {
    let lines = items
        .iter()
        .map(String::as_str)
        .map(parse_item)
        .collect::<Result<Vec<_>, _>>()?;
    let user = user.map(UserId::new);
    let total = subtotal(&lines);

    let lists = backend
        .available_promocodes(total, user.as_ref(), &lines)
        .await?;
    let suggestions = promocodes::select(lists, Utc::now());

    tracing::info!(
        cart_total = %display_amount(total),
        available = suggestions.available.len(),
        "Fetched promocode suggestions"
    );
    emit(&suggestions)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        let item = parse_item("P1:2:49.50").unwrap();
        assert_eq!(item.id, ProductId::new("P1"));
        assert_eq!(item.quantity, 2);
        assert_eq!(item.price, Decimal::new(4950, 2));
    }

    #[test]
    fn test_parse_item_keeps_colons_in_product_id() {
        let item = parse_item("sku:123:1:10").unwrap();
        assert_eq!(item.id, ProductId::new("sku:123"));
    }

    #[test]
    fn test_parse_item_rejects_garbage() {
        assert!(parse_item("P1:two:10").is_err());
        assert!(parse_item("P1:2").is_err());
        assert!(parse_item(":1:10").is_err());
    }
}
