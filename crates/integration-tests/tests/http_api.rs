//! The JSON API over a real socket.
//!
//! Each `reqwest` client keeps its own cookie jar, so each one is a separate
//! shopper session.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use harvest_hub_integration_tests::TestServer;
use harvest_hub_integration_tests::seed::{APPLES_ID, CARROTS_ID};

fn address() -> Value {
    json!({
        "full_name": "John Doe",
        "phone": "1234567890",
        "street": "123 Main St",
        "city": "Bengaluru",
        "district": "Bengaluru Urban",
        "state": "Karnataka",
        "country": "India",
        "pincode": "560001"
    })
}

async fn login(server: &TestServer, client: &reqwest::Client, email: &str, password: &str) {
    let resp = client
        .post(server.url("/auth/login"))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let server = TestServer::start().await;
    let client = server.client();

    let resp = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
    assert!(resp_has_request_id(&client, &server).await);

    let resp = client.get(server.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // A login writes the audit trail; make that write fail.
    server.store.set_fail_saves(true);
    login(&server, &client, "buyer@example.com", "password123").await;
    let resp = client.get(server.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

async fn resp_has_request_id(client: &reqwest::Client, server: &TestServer) -> bool {
    let resp = client.get(server.url("/health")).send().await.unwrap();
    resp.headers().contains_key("x-request-id")
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_browse_with_filters() {
    let server = TestServer::start().await;
    let client = server.client();

    let all: Vec<Value> = client
        .get(server.url("/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 11);

    let fruits: Vec<Value> = client
        .get(server.url("/products?category=Fruits&organic=true&currency=INR"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fruits.len(), 3);
    assert!(
        fruits
            .iter()
            .all(|p| p["price_display"].as_str().unwrap().starts_with('₹'))
    );

    let resp = client
        .get(server.url("/products/00000000-0000-0000-0000-00000000dead"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Cart & Checkout
// ============================================================================

#[tokio::test]
async fn test_cart_and_wallet_checkout() {
    let server = TestServer::start().await;
    let client = server.client();
    login(&server, &client, "buyer@example.com", "password123").await;

    let cart: Value = client
        .post(server.url("/cart/add"))
        .json(&json!({"product_id": APPLES_ID, "quantity": 2}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["count"], 2);
    assert_eq!(cart["subtotal"], "5.98");

    let quote: Value = client
        .post(server.url("/checkout/quote"))
        .json(&json!({"city": "Bengaluru", "district": "Bengaluru Urban", "state": "Karnataka"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quote["shipping_fee"], "0.96");
    assert_eq!(quote["total"], "6.94");

    let resp = client
        .post(server.url("/checkout/place"))
        .json(&json!({"shipping_address": address(), "payment_method": "wallet"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["total"], "6.94");
    assert_eq!(order["status"], "Confirmed");

    let cart: Value = client
        .get(server.url("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["count"], 0);

    let account: Value = client
        .get(server.url("/account"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(account["wallet_balance"], "93.06");

    let orders: Vec<Value> = client
        .get(server.url("/account/orders"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orders[0]["id"], order["id"]);
}

#[tokio::test]
async fn test_rejections_carry_notice_keys() {
    let server = TestServer::start().await;
    let client = server.client();

    let resp = client
        .post(server.url("/cart/add"))
        .json(&json!({"product_id": CARROTS_ID, "quantity": 6}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "cart.onlyAvailable");
    assert_eq!(body["message"], "Only 5 kg of Fresh Carrots available.");

    // Anonymous carts may fill up but not check out.
    client
        .post(server.url("/cart/add"))
        .json(&json!({"product_id": CARROTS_ID, "quantity": 1}))
        .send()
        .await
        .unwrap();
    let resp = client
        .post(server.url("/checkout/place"))
        .json(&json!({"shipping_address": address(), "payment_method": "cod"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "checkout.emptyCartOrNoSession");

    let resp = client.get(server.url("/account")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    login(&server, &client, "buyer@example.com", "password123").await;
    let mut bad = address();
    bad["pincode"] = json!("123");
    let resp = client
        .post(server.url("/checkout/place"))
        .json(&json!({"shipping_address": bad, "payment_method": "cod"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client.get(server.url("/admin/audit")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_register_logout_and_login() {
    let server = TestServer::start().await;
    let client = server.client();

    let resp = client
        .post(server.url("/auth/register"))
        .json(&json!({
            "full_name": "Asha Rao",
            "email": "Asha@Example.com",
            "mobile": "9876543210",
            "password": "harvest-time",
            "role": "Buyer"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let account: Value = client
        .get(server.url("/account"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(account["email"], "asha@example.com");

    let resp = client.post(server.url("/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = client.get(server.url("/account")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(server.url("/auth/register"))
        .json(&json!({
            "full_name": "Someone Else",
            "email": "asha@example.com",
            "mobile": "9876543210",
            "password": "another-one",
            "role": "Buyer"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .post(server.url("/auth/login"))
        .json(&json!({"email": "asha@example.com", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    login(&server, &client, "asha@example.com", "harvest-time").await;
}

#[tokio::test]
async fn test_admin_blocks_account() {
    let server = TestServer::start().await;
    let admin = server.client();
    let buyer = server.client();
    login(&server, &buyer, "buyer@example.com", "password123").await;
    login(&server, &admin, "admin@example.com", "admin@123").await;

    let accounts: Vec<Value> = admin
        .get(server.url("/admin/accounts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let buyer_id = accounts
        .iter()
        .find(|a| a["email"] == "buyer@example.com")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = admin
        .post(server.url(&format!("/admin/accounts/{buyer_id}/status")))
        .json(&json!({"active": false}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The open session is cut off on its next request.
    let resp = buyer.get(server.url("/account/orders")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let audit: Vec<Value> = admin
        .get(server.url("/admin/audit"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!audit.is_empty());
}
