//! End-to-end storefront flows against an in-memory backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::{Value, json};

use freshcart_integration_tests::{MockBackend, TestContext, cart_line};

// =============================================================================
// Location
// =============================================================================

#[tokio::test]
async fn test_malformed_pincode_never_reaches_backend() {
    let ctx = TestContext::start(MockBackend::new()).await;

    for raw in ["12ab56", "5600", ""] {
        let resp = ctx
            .post("/api/location/pincode", &json!({ "pincode": raw }))
            .await;
        assert_eq!(resp.status(), 400, "{raw:?}");
    }

    assert_eq!(ctx.backend.pincode_checks(), 0);
}

#[tokio::test]
async fn test_paused_local_warehouse_disables_shopping() {
    let backend = MockBackend::new();
    backend.set_pincode_mode("560001", "custom-disabled");
    let ctx = TestContext::start(backend).await;

    let resp = ctx
        .post("/api/location/pincode", &json!({ "pincode": "560001" }))
        .await;
    assert_eq!(resp.status(), 200);
    let state: Value = resp.json().await.unwrap();
    assert_eq!(state["deliveryMode"], "custom-disabled");

    let view: Value = ctx.get("/api/location").await.json().await.unwrap();
    assert_eq!(view["isDisabled"], true);
    assert_eq!(view["location"]["pincode"], "560001");

    // Already revalidated this session
    assert_eq!(ctx.backend.pincode_checks(), 1);
}

#[tokio::test]
async fn test_slow_detection_suggests_manual_entry_then_completes() {
    let backend = MockBackend::new();
    backend.set_pincode_mode("560034", "custom");
    backend.set_reverse_geocode("560034", Duration::from_millis(350));
    let ctx = TestContext::start(backend).await;

    // Establish the session before detection runs in the background
    let view: Value = ctx.get("/api/location").await.json().await.unwrap();
    assert_eq!(view["shouldAutoDetect"], true);

    let resp = ctx
        .post("/api/location/detect", &json!({ "lat": 12.93, "lng": 77.62 }))
        .await;
    assert_eq!(resp.status(), 202);
    let pending: Value = resp.json().await.unwrap();
    assert_eq!(pending["phase"], "manualEntrySuggested");

    tokio::time::sleep(Duration::from_millis(700)).await;

    let view: Value = ctx.get("/api/location").await.json().await.unwrap();
    assert_eq!(view["location"]["pincode"], "560034");
    assert_eq!(view["location"]["isLocationDetected"], true);
    assert_eq!(view["shouldAutoDetect"], false);
}

#[tokio::test]
async fn test_out_of_range_coordinates_are_rejected() {
    let ctx = TestContext::start(MockBackend::new()).await;

    let resp = ctx
        .post("/api/location/detect", &json!({ "lat": 91.0, "lng": 77.62 }))
        .await;
    assert_eq!(resp.status(), 400);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_login_merges_guest_cart_into_server_cart() {
    let backend = MockBackend::new();
    backend.seed_list("cart", "u1", vec![cart_line("P1", 3, "W1")]);
    let ctx = TestContext::start(backend).await;

    let resp = ctx.post("/api/cart/items", &cart_line("P1", 2, "W1")).await;
    assert_eq!(resp.status(), 200);

    let login = ctx.login("u1").await;
    let items = login["cart"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);

    let saved = ctx.backend.list("cart", "u1");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0]["quantity"], 5);

    // The guest copy is gone; the cart now comes from the backend
    let cart: Value = ctx.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["itemCount"], 5);
}

#[tokio::test]
async fn test_failed_merge_keeps_guest_cart() {
    let backend = MockBackend::new();
    backend.seed_list("cart", "u1", vec![cart_line("P2", 1, "W1")]);
    backend.fail_replace();
    let ctx = TestContext::start(backend).await;

    ctx.post("/api/cart/items", &cart_line("P1", 2, "W1")).await;

    // The login answers with the server cart as fetched
    let login = ctx.login("u1").await;
    let items = login["cart"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "P2");
    assert_eq!(ctx.backend.list("cart", "u1").len(), 1);

    // The guest cart is still stored for the next attempt
    let resp = ctx.post("/api/session/logout", &json!({})).await;
    assert_eq!(resp.status(), 204);
    let cart: Value = ctx.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["items"][0]["id"], "P1");
    assert_eq!(cart["itemCount"], 2);
}

#[tokio::test]
async fn test_overflowing_price_is_rejected() {
    let ctx = TestContext::start(MockBackend::new()).await;

    let resp = ctx
        .post(
            "/api/cart/items",
            &json!({
                "id": "P1",
                "quantity": 2,
                "price": "79228162514264337593543950335",
                "warehouseId": "W1",
            }),
        )
        .await;
    assert_eq!(resp.status(), 400);

    let cart: Value = ctx.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
async fn test_duplicate_add_while_first_is_running_conflicts() {
    let backend = MockBackend::new();
    backend.delay_adds(Duration::from_millis(300));
    let ctx = TestContext::start(backend).await;
    ctx.login("u1").await;
    // Both adds must see the same visitor
    ctx.get("/api/cart").await;

    let line = cart_line("P1", 1, "W1");
    let (first, second) = tokio::join!(
        ctx.post("/api/cart/items", &line),
        ctx.post("/api/cart/items", &line),
    );

    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 409]);
    assert_eq!(ctx.backend.list("cart", "u1").len(), 1);
}

#[tokio::test]
async fn test_cart_rejects_second_warehouse() {
    let ctx = TestContext::start(MockBackend::new()).await;

    ctx.post("/api/cart/items", &cart_line("P1", 1, "W1")).await;
    let resp = ctx.post("/api/cart/items", &cart_line("P2", 1, "W2")).await;
    assert_eq!(resp.status(), 409);

    let cart: Value = ctx.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_unavailable_delivery_blocks_checkout() {
    let backend = MockBackend::new();
    backend.fail_delivery("Maximum delivery distance exceeded");
    let ctx = TestContext::start(backend).await;

    ctx.post("/api/cart/items", &cart_line("P1", 2, "W1")).await;

    let summary: Value = ctx
        .get("/api/checkout/summary?lat=12.93&lng=77.62")
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(summary["canCheckout"], false);
    let blocker = summary["blockers"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["reason"] == "deliveryUnavailable")
        .unwrap();
    assert_eq!(blocker["title"], "Delivery Not Available");
    assert_eq!(blocker["message"], "Maximum delivery distance exceeded");
}

#[tokio::test]
async fn test_refusal_in_success_body_blocks_checkout() {
    let backend = MockBackend::new();
    backend.refuse_delivery("Maximum delivery distance exceeded");
    let ctx = TestContext::start(backend).await;

    ctx.post("/api/cart/items", &cart_line("P1", 2, "W1")).await;

    let quote: Value = ctx
        .post(
            "/api/delivery/quote",
            &json!({ "lat": 12.93, "lng": 77.62 }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(quote["available"], false);
    assert_eq!(quote["title"], "Delivery Not Available");

    let summary: Value = ctx
        .get("/api/checkout/summary?lat=12.93&lng=77.62")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(summary["canCheckout"], false);
    assert_eq!(summary["deliveryCharge"], "0");
    assert!(
        summary["blockers"]
            .as_array()
            .unwrap()
            .iter()
            .any(|b| b["message"] == "Maximum delivery distance exceeded")
    );
}

#[tokio::test]
async fn test_checkout_with_delivery_adds_charge() {
    let ctx = TestContext::start(MockBackend::new()).await;
    ctx.post("/api/cart/items", &cart_line("P1", 2, "W1")).await;

    let summary: Value = ctx
        .get("/api/checkout/summary?lat=12.93&lng=77.62&paymentMethod=cod")
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(summary["canCheckout"], true);
    assert_eq!(summary["subtotal"], "240.00");
    assert_eq!(summary["deliveryCharge"], "30");
    assert_eq!(summary["total"], "270.00");
}

// =============================================================================
// Promocodes
// =============================================================================

#[tokio::test]
async fn test_promocode_suggestions_for_cart() {
    let backend = MockBackend::new();
    backend.set_promocodes(json!({
        "available": [
            { "code": "SMALL", "potentialDiscount": "10" },
            { "code": "OFF", "potentialDiscount": "90", "isActive": false },
            { "code": "BIG", "potentialDiscount": "50" },
            { "code": "MID", "potentialDiscount": "25" },
            { "code": "TINY", "potentialDiscount": "5" },
        ],
        "almostAvailable": [
            { "code": "FAR", "amountNeeded": "300" },
            { "code": "NEAR", "amountNeeded": "40" },
        ],
    }));
    let ctx = TestContext::start(backend).await;

    // Empty cart: nothing to suggest, backend not asked
    let empty: Value = ctx
        .get("/api/promocodes/suggestions")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(empty["available"].as_array().unwrap().len(), 0);
    assert_eq!(ctx.backend.promocode_lookups(), 0);

    ctx.post("/api/cart/items", &cart_line("P1", 2, "W1")).await;
    let suggestions: Value = ctx
        .get("/api/promocodes/suggestions")
        .await
        .json()
        .await
        .unwrap();

    let codes: Vec<&str> = suggestions["available"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, ["BIG", "MID", "SMALL"]);
    assert_eq!(suggestions["almostAvailable"]["code"], "NEAR");
}

// =============================================================================
// Wishlist
// =============================================================================

#[tokio::test]
async fn test_wishlist_variants_are_separate_entries() {
    let ctx = TestContext::start(MockBackend::new()).await;

    for variant in ["red", "blue"] {
        let resp = ctx
            .post(
                "/api/wishlist/items",
                &json!({ "productId": "P1", "variantId": variant }),
            )
            .await;
        assert_eq!(resp.status(), 200);
    }

    let resp = ctx
        .post(
            "/api/wishlist/items",
            &json!({ "productId": "P1", "variantId": "red" }),
        )
        .await;
    assert_eq!(resp.status(), 409);

    let list: Value = ctx.get("/api/wishlist").await.json().await.unwrap();
    assert_eq!(list["items"].as_array().unwrap().len(), 2);

    let status: Value = ctx
        .get("/api/wishlist/status?productId=P1&variantId=red")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(status, json!({ "listed": true, "pending": false }));

    let status: Value = ctx
        .get("/api/wishlist/status?productId=P1&variantId=green")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(status["listed"], false);
}

#[tokio::test]
async fn test_removing_missing_wishlist_entry_refetches() {
    let backend = MockBackend::new();
    backend.seed_list(
        "wishlist",
        "u2",
        vec![json!({ "productId": "P9", "addedAt": "2026-01-01T00:00:00Z" })],
    );
    let ctx = TestContext::start(backend).await;
    ctx.login("u2").await;

    let resp = ctx.delete("/api/wishlist/items?productId=GONE").await;
    assert_eq!(resp.status(), 200);

    let list: Value = resp.json().await.unwrap();
    let items = list["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["productId"], "P9");
}
