//! Grocery backend client implementation.
//!
//! JSON over `reqwest`. Blog categories and the public product listing are
//! cached using `moka` (5-minute TTL); everything else goes to the backend
//! on every call.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use freshcart_core::{ItemKey, Money, Pincode, UserId};

use super::cache::{CacheKey, CacheValue};
use super::types::{
    BlogPage, BlogQuery, CartItem, DeliveryQuote, DeliveryQuoteRequest, ItemsEnvelope,
    PincodeCheck, PincodeProductQuery, ProductPage, ProductQuery, PromoCartLine, PromoCodeLists,
    QuantityUpdate, ReverseGeocode,
};
use super::{BackendError, extract_error_message};
use crate::config::BackendConfig;

const NO_QUERY: &[(&str, &str)] = &[];

/// Per-user list records kept by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListResource {
    Cart,
    Wishlist,
}

impl ListResource {
    const fn segment(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        }
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the grocery REST backend.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url,
                api_token: config.api_token.clone(),
                cache,
            }),
        })
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match &self.inner.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and return the raw body of a successful response.
    async fn send(&self, builder: RequestBuilder) -> Result<String, BackendError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Read the body first for better error diagnostics
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(extract_error_message(&body)));
        }

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        Ok(body)
    }

    /// Send a request and parse the JSON response.
    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        let body = self.send(builder).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &(impl Serialize + ?Sized),
    ) -> Result<T, BackendError> {
        let url = self.endpoint(segments)?;
        self.execute(self.request(Method::GET, url).query(query))
            .await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &(impl Serialize + ?Sized),
    ) -> Result<T, BackendError> {
        let url = self.endpoint(segments)?;
        self.execute(self.request(method, url).json(body)).await
    }

    // =========================================================================
    // Location Methods
    // =========================================================================

    /// Ask the backend how a pincode is served.
    ///
    /// # Errors
    ///
    /// Returns an error if the pincode is not serviceable or the request fails.
    #[instrument(skip(self), fields(pincode = %pincode))]
    pub async fn check_pincode(&self, pincode: &Pincode) -> Result<PincodeCheck, BackendError> {
        self.get_json(&["warehouses", "check-pincode", pincode.as_str()], NO_QUERY)
            .await
    }

    /// Resolve coordinates to a pincode.
    ///
    /// # Errors
    ///
    /// Returns an error if no pincode is known for the position or the
    /// request fails.
    #[instrument(skip(self))]
    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<ReverseGeocode, BackendError> {
        self.get_json(&["location", "reverse-geocode"], &[("lat", lat), ("lng", lng)])
            .await
    }

    // =========================================================================
    // Delivery Methods
    // =========================================================================

    /// Price a delivery for the given position and cart.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` carrying the backend's `error` message when
    /// delivery is not possible (e.g. out of range).
    #[instrument(skip(self))]
    pub async fn calculate_delivery(
        &self,
        request: &DeliveryQuoteRequest,
    ) -> Result<DeliveryQuote, BackendError> {
        self.send_json(Method::POST, &["delivery", "calculate"], request)
            .await
    }

    // =========================================================================
    // Promocode Methods
    // =========================================================================

    /// Fetch promocodes applicable (or nearly applicable) to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn available_promocodes(
        &self,
        cart_total: Money,
        user_id: Option<&UserId>,
        items: &[CartItem],
    ) -> Result<PromoCodeLists, BackendError> {
        let lines: Vec<PromoCartLine<'_>> = items
            .iter()
            .map(|item| PromoCartLine {
                product_id: &item.id,
                quantity: item.quantity,
                price: item.price,
            })
            .collect();
        let cart_items = serde_json::to_string(&lines)?;

        let mut query = vec![
            ("cartTotal", cart_total.to_string()),
            ("cartItems", cart_items),
        ];
        if let Some(user_id) = user_id {
            query.push(("userId", user_id.to_string()));
        }

        self.get_json(&["promocodes", "available"], &query).await
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Products stocked by the warehouse serving a pincode.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(pincode = %pincode))]
    pub async fn products_by_pincode(
        &self,
        pincode: &Pincode,
        query: &ProductQuery,
    ) -> Result<ProductPage, BackendError> {
        let body = PincodeProductQuery {
            pincode: pincode.as_str(),
            query,
        };
        self.send_json(Method::POST, &["warehouses", "products-by-pincode"], &body)
            .await
    }

    /// Products available everywhere (global fulfilment).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn public_products(&self, query: &ProductQuery) -> Result<ProductPage, BackendError> {
        let cache_key = CacheKey::PublicProducts(query.clone());

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for public products");
            return Ok(page);
        }

        let page: ProductPage = self.get_json(&["products", "public"], query).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    // =========================================================================
    // Blog Methods
    // =========================================================================

    /// A page of published blog posts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn published_blogs(&self, query: &BlogQuery) -> Result<BlogPage, BackendError> {
        self.get_json(&["blogs", "published"], query).await
    }

    /// All blog categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn blog_categories(&self) -> Result<Vec<String>, BackendError> {
        if let Some(CacheValue::BlogCategories(categories)) =
            self.inner.cache.get(&CacheKey::BlogCategories).await
        {
            debug!("Cache hit for blog categories");
            return Ok(categories);
        }

        let categories: Vec<String> = self.get_json(&["blogs", "categories"], NO_QUERY).await?;

        self.inner
            .cache
            .insert(
                CacheKey::BlogCategories,
                CacheValue::BlogCategories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Cart & Wishlist Methods
    // =========================================================================

    /// Load a signed-in user's cart or wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        resource: ListResource,
        user_id: &UserId,
    ) -> Result<Vec<T>, BackendError> {
        let envelope: ItemsEnvelope<T> = self
            .get_json(&[resource.segment(), user_id.as_str()], NO_QUERY)
            .await?;
        Ok(envelope.items)
    }

    /// Add one entry and return the updated list.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the entry or the request fails.
    #[instrument(skip(self, item), fields(user_id = %user_id))]
    pub async fn add_list_item<T: Serialize + DeserializeOwned>(
        &self,
        resource: ListResource,
        user_id: &UserId,
        item: &T,
    ) -> Result<Vec<T>, BackendError> {
        let envelope: ItemsEnvelope<T> = self
            .send_json(
                Method::POST,
                &[resource.segment(), user_id.as_str(), "items"],
                item,
            )
            .await?;
        Ok(envelope.items)
    }

    /// Change the quantity of a cart line and return the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist or the request fails.
    #[instrument(skip(self), fields(user_id = %user_id, key = %key))]
    pub async fn update_cart_quantity(
        &self,
        user_id: &UserId,
        key: &ItemKey,
        quantity: u32,
    ) -> Result<Vec<CartItem>, BackendError> {
        let body = QuantityUpdate {
            product_id: &key.product_id,
            variant_id: key.variant_id.as_ref(),
            quantity,
        };
        let envelope: ItemsEnvelope<CartItem> = self
            .send_json(
                Method::PATCH,
                &[ListResource::Cart.segment(), user_id.as_str(), "items"],
                &body,
            )
            .await?;
        Ok(envelope.items)
    }

    /// Delete one entry.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the entry is already gone.
    #[instrument(skip(self), fields(user_id = %user_id, key = %key))]
    pub async fn remove_list_item(
        &self,
        resource: ListResource,
        user_id: &UserId,
        key: &ItemKey,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&[
            resource.segment(),
            user_id.as_str(),
            "items",
            key.product_id.as_str(),
        ])?;

        let mut builder = self.request(Method::DELETE, url);
        if let Some(variant_id) = &key.variant_id {
            builder = builder.query(&[("variantId", variant_id.as_str())]);
        }

        self.send(builder).await.map(|_| ())
    }

    /// Replace the whole list (used after a login merge).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, items), fields(user_id = %user_id, items = items.len()))]
    pub async fn replace_list<T: Serialize + DeserializeOwned>(
        &self,
        resource: ListResource,
        user_id: &UserId,
        items: &[T],
    ) -> Result<Vec<T>, BackendError> {
        #[derive(Serialize)]
        struct Body<'a, T> {
            items: &'a [T],
        }

        let envelope: ItemsEnvelope<T> = self
            .send_json(
                Method::PUT,
                &[resource.segment(), user_id.as_str()],
                &Body { items },
            )
            .await?;
        Ok(envelope.items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(&BackendConfig::for_url(base)).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("http://localhost:4000/api");
        let url = client.endpoint(&["blogs", "categories"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/api/blogs/categories");
    }

    #[test]
    fn test_endpoint_with_trailing_slash_base() {
        let client = client("http://localhost:4000/api/");
        let url = client.endpoint(&["delivery", "calculate"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/api/delivery/calculate");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("http://localhost:4000");
        let url = client.endpoint(&["cart", "user/1 2", "items"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/cart/user%2F1%202/items");
    }

    #[test]
    fn test_new_rejects_non_base_url() {
        let result = BackendClient::new(&BackendConfig::for_url("mailto:ops@freshcart.in"));
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));
    }
}
