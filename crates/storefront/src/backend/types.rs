//! Wire types for the grocery backend.
//!
//! Field names follow the backend's camelCase JSON. Listing payloads keep
//! unknown fields in `extra` so the storefront can pass them through to the
//! browser untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freshcart_core::{
    DeliveryMode, DiscountType, ItemKey, Money, PaymentMethod, ProductId, VariantId, WarehouseId,
};

// =============================================================================
// Cart & Wishlist
// =============================================================================

/// A line in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product id.
    pub id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    /// Opaque variant attributes (size, colour, pack) as chosen in the UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variant: Option<serde_json::Value>,
    pub quantity: u32,
    pub price: Money,
    pub warehouse_id: WarehouseId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CartItem {
    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.id.clone(), self.variant_id.clone())
    }

    /// Price times quantity, saturating at `Money::MAX`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price.saturating_mul(Money::from(self.quantity))
    }
}

/// An entry in a wishlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variant: Option<serde_json::Value>,
    pub added_at: DateTime<Utc>,
}

impl WishlistItem {
    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.product_id.clone(), self.variant_id.clone())
    }
}

/// `{ "items": [...] }` envelope used by the cart and wishlist endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Body of a quantity change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityUpdate<'a> {
    pub product_id: &'a ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<&'a VariantId>,
    pub quantity: u32,
}

// =============================================================================
// Location & Delivery
// =============================================================================

/// Minimal warehouse reference returned by location and delivery endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseSummary {
    #[serde(alias = "_id")]
    pub id: WarehouseId,
    pub name: String,
}

/// Result of `GET /warehouses/check-pincode/{pincode}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PincodeCheck {
    pub mode: DeliveryMode,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub warehouse: Option<WarehouseSummary>,
}

/// Result of `GET /location/reverse-geocode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseGeocode {
    /// Raw pincode; validated by the caller.
    pub pincode: String,
}

/// Body of `POST /delivery/calculate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryQuoteRequest {
    pub customer_lat: f64,
    pub customer_lng: f64,
    pub cart_total: Money,
    pub payment_method: PaymentMethod,
}

/// Successful response of `POST /delivery/calculate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryQuote {
    /// False when the backend refuses the delivery with a 2xx answer.
    #[serde(default = "available_by_default")]
    pub available: bool,
    /// Refusal reason accompanying `available: false`.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warehouse: Option<WarehouseSummary>,
    /// Distance in kilometres.
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub delivery_charge: Money,
    #[serde(default)]
    pub total_delivery_charge: Money,
    #[serde(default)]
    pub is_free_delivery: bool,
    #[serde(default)]
    pub free_delivery_eligible: bool,
    #[serde(default)]
    pub amount_needed_for_free_delivery: Money,
    #[serde(default)]
    pub warehouse_settings: Option<serde_json::Value>,
}

const fn available_by_default() -> bool {
    true
}

// =============================================================================
// Promocodes
// =============================================================================

/// A promocode as returned by `GET /promocodes/available`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub discount_value: Money,
    /// Discount this code would give on the current cart.
    #[serde(default)]
    pub potential_discount: Money,
    /// How much more the cart needs before the code applies.
    #[serde(default)]
    pub amount_needed: Option<Money>,
    #[serde(default)]
    pub min_order_value: Option<Money>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// Response of `GET /promocodes/available`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeLists {
    #[serde(default)]
    pub available: Vec<PromoCode>,
    #[serde(default)]
    pub almost_available: Vec<PromoCode>,
}

/// Compact cart line sent to the promocode endpoint for category scoping.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCartLine<'a> {
    pub product_id: &'a ProductId,
    pub quantity: u32,
    pub price: Money,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub price: Money,
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    #[serde(alias = "_id")]
    pub id: VariantId,
    pub name: String,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Paged product listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub current_page: u32,
}

/// Query for product listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Body of `POST /warehouses/products-by-pincode`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PincodeProductQuery<'a> {
    pub pincode: &'a str,
    #[serde(flatten)]
    pub query: &'a ProductQuery,
}

// =============================================================================
// Blog
// =============================================================================

/// A published blog post summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response of `GET /blogs/published`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPage {
    #[serde(default)]
    pub blogs: Vec<BlogPost>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub current_page: u32,
}

/// Query for `GET /blogs/published`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cart_item_accepts_numeric_price_and_missing_variant() {
        let item: CartItem = serde_json::from_value(json!({
            "id": "P1",
            "quantity": 2,
            "price": 45.5,
            "warehouseId": "W1"
        }))
        .unwrap();

        assert_eq!(item.key(), ItemKey::new(ProductId::new("P1"), None));
        assert_eq!(item.line_total(), Decimal::new(9100, 2));
    }

    #[test]
    fn test_line_total_saturates_instead_of_overflowing() {
        let item: CartItem = serde_json::from_value(json!({
            "id": "P1",
            "quantity": 2,
            "price": "79228162514264337593543950335",
            "warehouseId": "W1"
        }))
        .unwrap();

        assert_eq!(item.line_total(), Decimal::MAX);
    }

    #[test]
    fn test_cart_item_omits_absent_optionals() {
        let item = CartItem {
            id: ProductId::new("P1"),
            variant_id: None,
            variant_name: None,
            selected_variant: None,
            quantity: 1,
            price: Decimal::from(10),
            warehouse_id: WarehouseId::new("W1"),
            warehouse_name: None,
            name: None,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("variantId").is_none());
        assert_eq!(value["warehouseId"], "W1");
    }

    #[test]
    fn test_delivery_quote_defaults_missing_fields() {
        let quote: DeliveryQuote = serde_json::from_value(json!({
            "deliveryCharge": 30,
            "totalDeliveryCharge": 30,
            "distance": 4.2
        }))
        .unwrap();

        assert_eq!(quote.total_delivery_charge, Decimal::from(30));
        assert!(!quote.is_free_delivery);
        assert_eq!(quote.amount_needed_for_free_delivery, Decimal::ZERO);
        assert!(quote.warehouse.is_none());
    }

    #[test]
    fn test_pincode_check_modes() {
        let check: PincodeCheck = serde_json::from_value(json!({
            "mode": "custom-disabled",
            "message": "Delivery paused",
            "warehouse": {"_id": "W9", "name": "Indiranagar"}
        }))
        .unwrap();

        assert_eq!(check.mode, DeliveryMode::CustomDisabled);
        assert_eq!(check.warehouse.unwrap().id, WarehouseId::new("W9"));
    }

    #[test]
    fn test_product_keeps_unknown_fields() {
        let product: Product = serde_json::from_value(json!({
            "_id": "P7",
            "name": "Alphonso Mango",
            "price": "120.00",
            "images": ["a.jpg"]
        }))
        .unwrap();

        assert_eq!(product.id, ProductId::new("P7"));
        assert!(product.extra.contains_key("images"));
        let back = serde_json::to_value(&product).unwrap();
        assert_eq!(back["images"][0], "a.jpg");
    }

    #[test]
    fn test_pincode_product_query_flattens() {
        let query = ProductQuery {
            page: Some(2),
            limit: Some(20),
            category: None,
        };
        let body = serde_json::to_value(PincodeProductQuery {
            pincode: "560001",
            query: &query,
        })
        .unwrap();

        assert_eq!(body, json!({"pincode": "560001", "page": 2, "limit": 20}));
    }
}
