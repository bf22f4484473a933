//! Integration tests for the FreshCart storefront.
//!
//! Each test starts two servers on ephemeral ports: an in-memory stand-in
//! for the grocery backend ([`MockBackend`]) and the real storefront router
//! pointed at it. Requests go through a cookie-keeping client, so session
//! behaviour (guest lists, login hand-off) is exercised end to end.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p freshcart-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = MockBackend::new();
//! backend.set_pincode_mode("560034", "custom");
//!
//! let ctx = TestContext::start(backend).await;
//! let resp = ctx.post("/api/location/pincode", &json!({"pincode": "560034"})).await;
//! assert_eq!(resp.status(), 200);
//! ```

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use freshcart_storefront::config::{BackendConfig, LocationConfig, StorefrontConfig};
use freshcart_storefront::state::AppState;

// =============================================================================
// Mock backend
// =============================================================================

#[derive(Default)]
struct MockState {
    /// Keyed by (`cart` | `wishlist`, user id).
    lists: HashMap<(&'static str, String), Vec<Value>>,
    pincode_modes: HashMap<String, String>,
    delivery_error: Option<String>,
    delivery_refusal: Option<String>,
    fail_replace: bool,
    add_delay: Duration,
    geocode: Option<(String, Duration)>,
    promocodes: Option<Value>,
}

/// In-memory grocery backend.
///
/// Unknown pincodes are served in global mode. Delivery quotes succeed with
/// a flat charge unless [`MockBackend::fail_delivery`] or
/// [`MockBackend::refuse_delivery`] was called.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    pincode_checks: Arc<AtomicUsize>,
    promocode_lookups: Arc<AtomicUsize>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Pre-populate a user's `cart` or `wishlist`.
    pub fn seed_list(&self, kind: &'static str, user: &str, items: Vec<Value>) {
        self.with_state(|s| s.lists.insert((kind, user.to_string()), items));
    }

    /// Current contents of a user's `cart` or `wishlist`.
    #[must_use]
    pub fn list(&self, kind: &'static str, user: &str) -> Vec<Value> {
        self.with_state(|s| {
            s.lists
                .get(&(kind, user.to_string()))
                .cloned()
                .unwrap_or_default()
        })
    }

    pub fn set_pincode_mode(&self, pincode: &str, mode: &str) {
        self.with_state(|s| s.pincode_modes.insert(pincode.to_string(), mode.to_string()));
    }

    /// Make every delivery quote fail with a 400 carrying `message`.
    pub fn fail_delivery(&self, message: &str) {
        self.with_state(|s| s.delivery_error = Some(message.to_string()));
    }

    /// Answer delivery quotes with 200 `{available: false, error}`.
    pub fn refuse_delivery(&self, message: &str) {
        self.with_state(|s| s.delivery_refusal = Some(message.to_string()));
    }

    /// Make every whole-list replacement (the login merge) fail with 500.
    pub fn fail_replace(&self) {
        self.with_state(|s| s.fail_replace = true);
    }

    /// Body returned by `GET /promocodes/available`.
    pub fn set_promocodes(&self, lists: Value) {
        self.with_state(|s| s.promocodes = Some(lists));
    }

    /// Number of promocode lookups received so far.
    #[must_use]
    pub fn promocode_lookups(&self) -> usize {
        self.promocode_lookups.load(Ordering::SeqCst)
    }

    /// Answer reverse geocoding with `pincode` after `delay`.
    pub fn set_reverse_geocode(&self, pincode: &str, delay: Duration) {
        self.with_state(|s| s.geocode = Some((pincode.to_string(), delay)));
    }

    /// Hold every add-item request for `delay` before answering.
    pub fn delay_adds(&self, delay: Duration) {
        self.with_state(|s| s.add_delay = delay);
    }

    /// Number of pincode checks received so far.
    #[must_use]
    pub fn pincode_checks(&self) -> usize {
        self.pincode_checks.load(Ordering::SeqCst)
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/warehouses/check-pincode/{pincode}", get(check_pincode))
            .route("/location/reverse-geocode", get(reverse_geocode))
            .route("/delivery/calculate", post(calculate_delivery))
            .route("/promocodes/available", get(available_promocodes))
            .with_state(self.clone())
            .nest("/cart", list_routes(self.clone(), "cart"))
            .nest("/wishlist", list_routes(self.clone(), "wishlist"))
    }

    /// Serve on an ephemeral port and return the base URL.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn serve(&self) -> String {
        let addr = spawn(self.router()).await;
        format!("http://{addr}")
    }
}

async fn check_pincode(
    State(mock): State<MockBackend>,
    Path(pincode): Path<String>,
) -> Json<Value> {
    mock.pincode_checks.fetch_add(1, Ordering::SeqCst);
    let mode = mock
        .with_state(|s| s.pincode_modes.get(&pincode).cloned())
        .unwrap_or_else(|| "global".to_string());

    let warehouse = (mode != "global").then(|| json!({"_id": "W1", "name": "HSR Layout"}));
    Json(json!({
        "mode": mode,
        "message": format!("Serving {pincode} in {mode} mode"),
        "warehouse": warehouse,
    }))
}

async fn reverse_geocode(State(mock): State<MockBackend>) -> Response {
    let Some((pincode, delay)) = mock.with_state(|s| s.geocode.clone()) else {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "No pincode for position"})))
            .into_response();
    };
    tokio::time::sleep(delay).await;
    Json(json!({ "pincode": pincode })).into_response()
}

async fn calculate_delivery(State(mock): State<MockBackend>, Json(_body): Json<Value>) -> Response {
    if let Some(message) = mock.with_state(|s| s.delivery_error.clone()) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
    }
    if let Some(message) = mock.with_state(|s| s.delivery_refusal.clone()) {
        return Json(json!({ "available": false, "error": message })).into_response();
    }
    Json(json!({
        "warehouse": {"_id": "W1", "name": "HSR Layout"},
        "distance": 2.4,
        "deliveryCharge": "30",
        "totalDeliveryCharge": "30",
        "isFreeDelivery": false,
        "freeDeliveryEligible": true,
        "amountNeededForFreeDelivery": "150",
    }))
    .into_response()
}

async fn available_promocodes(State(mock): State<MockBackend>) -> Json<Value> {
    mock.promocode_lookups.fetch_add(1, Ordering::SeqCst);
    let lists = mock
        .with_state(|s| s.promocodes.clone())
        .unwrap_or_else(|| json!({ "available": [], "almostAvailable": [] }));
    Json(lists)
}

#[derive(Clone)]
struct ListHandle {
    mock: MockBackend,
    kind: &'static str,
}

impl ListHandle {
    fn envelope(&self, user: &str) -> Json<Value> {
        Json(json!({ "items": self.mock.list(self.kind, user) }))
    }
}

fn list_routes(mock: MockBackend, kind: &'static str) -> Router {
    Router::new()
        .route("/{user}", get(get_list).put(replace_list))
        .route("/{user}/items", post(add_item))
        .route("/{user}/items/{product}", delete(remove_item))
        .with_state(ListHandle { mock, kind })
}

async fn get_list(State(list): State<ListHandle>, Path(user): Path<String>) -> Json<Value> {
    list.envelope(&user)
}

async fn replace_list(
    State(list): State<ListHandle>,
    Path(user): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if list.mock.with_state(|s| s.fail_replace) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Write failed"})))
            .into_response();
    }
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    list.mock.seed_list(list.kind, &user, items);
    list.envelope(&user).into_response()
}

async fn add_item(
    State(list): State<ListHandle>,
    Path(user): Path<String>,
    Json(item): Json<Value>,
) -> Json<Value> {
    let delay = list.mock.with_state(|s| s.add_delay);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    list.mock.with_state(|s| {
        s.lists
            .entry((list.kind, user.clone()))
            .or_default()
            .push(item);
    });
    list.envelope(&user)
}

async fn remove_item(
    State(list): State<ListHandle>,
    Path((user, product)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let variant = query.get("variantId").map(String::as_str);
    let matches = |entry: &Value| {
        let id = entry.get("productId").or_else(|| entry.get("id"));
        id.and_then(Value::as_str) == Some(product.as_str())
            && entry.get("variantId").and_then(Value::as_str) == variant
    };

    let removed = list.mock.with_state(|s| {
        let items = s.lists.entry((list.kind, user.clone())).or_default();
        let before = items.len();
        items.retain(|entry| !matches(entry));
        before != items.len()
    });

    if removed {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"error": "Item not found"}))).into_response()
    }
}

// =============================================================================
// Storefront under test
// =============================================================================

/// A running storefront wired to a [`MockBackend`].
pub struct TestContext {
    /// Keeps cookies, so consecutive requests share one session.
    pub client: reqwest::Client,
    pub storefront_url: String,
    pub backend: MockBackend,
}

impl TestContext {
    /// Start the mock backend and a storefront pointed at it.
    ///
    /// Detection deadlines are shortened so timeout paths finish quickly.
    ///
    /// # Panics
    ///
    /// Panics if a server cannot be started.
    pub async fn start(backend: MockBackend) -> Self {
        let backend_url = backend.serve().await;

        let config = StorefrontConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: "http://localhost".to_string(),
            backend: BackendConfig::for_url(backend_url),
            location: LocationConfig {
                soft_timeout: Duration::from_millis(200),
                hard_timeout: Duration::from_millis(600),
                ..LocationConfig::default()
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let state = AppState::new(config).expect("storefront state");
        let addr = spawn(freshcart_storefront::app(state)).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("http client");

        Self {
            client,
            storefront_url: format!("http://{addr}"),
            backend,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request")
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE request")
    }

    /// Sign in through the login hand-off and return its body.
    ///
    /// # Panics
    ///
    /// Panics if the hand-off does not succeed.
    pub async fn login(&self, user_id: &str) -> Value {
        let resp = self
            .post("/api/session/login", &json!({ "userId": user_id }))
            .await;
        assert_eq!(resp.status(), 200, "login failed");
        resp.json().await.expect("login body")
    }
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local address");
    tokio::spawn(async move { axum::serve(listener, router).await.ok() });
    addr
}

/// A cart line as the storefront expects it in an add request.
#[must_use]
pub fn cart_line(product: &str, quantity: u32, warehouse: &str) -> Value {
    json!({
        "id": product,
        "quantity": quantity,
        "price": "120.00",
        "warehouseId": warehouse,
    })
}
