#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
    routing::post,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use gogi_core::{UserId, UserRole};

use super::routes;
use crate::db::memory::MemoryCheckoutStore;
use crate::middleware::session::{SESSION_COOKIE_NAME, session_layer};
use crate::middleware::set_current_user;
use crate::models::CurrentUser;
use crate::testing::{StubVerifier, test_state};

const BUYER: UserId = UserId::new(1_000);
const OTHER: UserId = UserId::new(2_000);

async fn test_login(session: Session, Json(user): Json<CurrentUser>) -> StatusCode {
    set_current_user(&session, &user).await.unwrap();
    StatusCode::NO_CONTENT
}

struct Harness {
    app: Router,
    store: Arc<MemoryCheckoutStore>,
}

fn harness(payments: StubVerifier) -> Harness {
    let store = Arc::new(MemoryCheckoutStore::new());
    let state = test_state(store.clone(), Arc::new(payments));
    let app = routes()
        .route("/test/login", post(test_login))
        .layer(session_layer(MemoryStore::default(), false))
        .with_state(state);
    Harness { app, store }
}

impl Harness {
    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Sign in and return the session cookie.
    async fn login(&self, id: UserId, role: UserRole) -> String {
        let user = CurrentUser {
            id,
            email: None,
            name: Some("Kim Minji".to_string()),
            role,
        };
        let response = self
            .send(json_request("POST", "/test/login", None, &json!(user)))
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        session_cookie(&response).unwrap()
    }
}

fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(SESSION_COOKIE_NAME))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// 2 x 5,000 + 1 x 5,000 = 15,000 won in the buyer's cart.
fn fill_cart(store: &MemoryCheckoutStore) {
    let brisket = store.add_product("Hanwoo brisket 300g", 5_000);
    let ribs = store.add_product("Pork ribs 500g", 5_000);
    store.add_to_cart(BUYER, brisket, 2);
    store.add_to_cart(BUYER, ribs, 1);
}

#[tokio::test]
async fn test_health() {
    let h = harness(StubVerifier::failing("unused"));
    let response = h.send(get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_requires_login() {
    let h = harness(StubVerifier::failing("unused"));

    for uri in ["/api/cart", "/api/orders", "/api/addresses", "/api/session"] {
        let response = h.send(get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body_json(response).await["message"], "Login required");
    }

    let response = h
        .send(json_request(
            "POST",
            "/api/checkout/cart/mobile-complete",
            None,
            &json!({ "impUid": "imp_1" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_returns_current_user_until_logout() {
    let h = harness(StubVerifier::failing("unused"));
    let cookie = h.login(BUYER, UserRole::User).await;

    let response = h.send(get("/api/session", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let user = body_json(response).await;
    assert_eq!(user["id"], 1_000);
    assert_eq!(user["role"], "USER");

    let response = h
        .send(json_request("POST", "/auth/logout", Some(&cookie), &json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = h.send(get("/api/session", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mobile_complete_creates_paid_order() {
    let h = harness(StubVerifier::paying("paid", 15_000.0));
    fill_cart(&h.store);
    let cookie = h.login(BUYER, UserRole::User).await;

    let response = h
        .send(json_request(
            "POST",
            "/api/checkout/cart/mobile-complete",
            Some(&cookie),
            &json!({ "impUid": "imp_123", "merchantUid": "order_abc" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["status"], "PAID");
    assert_eq!(order["totalAmount"], 15_000);
    assert_eq!(order["paymentUid"], "imp_123");
    assert_eq!(order["merchantUid"], "order_abc");
    assert_eq!(order["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(h.store.cart_len(BUYER), 0);
}

#[tokio::test]
async fn test_mobile_complete_trims_imp_uid() {
    let h = harness(StubVerifier::paying("paid", 15_000.0));
    fill_cart(&h.store);
    let cookie = h.login(BUYER, UserRole::User).await;

    let response = h
        .send(json_request(
            "POST",
            "/api/checkout/cart/mobile-complete",
            Some(&cookie),
            &json!({ "impUid": "  imp_pad \n" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = body_json(response).await;
    assert_eq!(first["paymentUid"], "imp_pad");

    let response = h
        .send(json_request(
            "POST",
            "/api/checkout/cart/mobile-complete",
            Some(&cookie),
            &json!({ "impUid": "imp_pad" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["id"], first["id"]);
    assert_eq!(h.store.order_count(), 1);
}

#[tokio::test]
async fn test_mobile_complete_amount_mismatch_keeps_cart() {
    let h = harness(StubVerifier::paying("paid", 14_999.0));
    fill_cart(&h.store);
    let cookie = h.login(BUYER, UserRole::User).await;

    let response = h
        .send(json_request(
            "POST",
            "/api/checkout/cart/mobile-complete",
            Some(&cookie),
            &json!({ "impUid": "imp_123" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Paid amount does not match the order total"
    );
    assert_eq!(h.store.order_count(), 0);
    assert_eq!(h.store.cart_len(BUYER), 2);
}

#[tokio::test]
async fn test_mobile_complete_requires_imp_uid() {
    let h = harness(StubVerifier::paying("paid", 15_000.0));
    let cookie = h.login(BUYER, UserRole::User).await;

    for body in [json!({}), json!({ "impUid": "  " })] {
        let response = h
            .send(json_request(
                "POST",
                "/api/checkout/cart/mobile-complete",
                Some(&cookie),
                &body,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "impUid is required");
    }
}

#[tokio::test]
async fn test_mobile_complete_provider_failure_is_bad_gateway() {
    let h = harness(StubVerifier::failing("invalid imp_uid"));
    fill_cart(&h.store);
    let cookie = h.login(BUYER, UserRole::User).await;

    let response = h
        .send(json_request(
            "POST",
            "/api/checkout/cart/mobile-complete",
            Some(&cookie),
            &json!({ "impUid": "imp_404" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
async fn test_cart_order_with_empty_body_and_empty_cart() {
    let h = harness(StubVerifier::failing("unused"));
    let cookie = h.login(BUYER, UserRole::User).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/orders/cart")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = h.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Your cart is empty");
}

#[tokio::test]
async fn test_cart_order_is_pending_and_clears_cart() {
    let h = harness(StubVerifier::failing("unused"));
    fill_cart(&h.store);
    let cookie = h.login(BUYER, UserRole::User).await;

    let response = h
        .send(json_request("POST", "/api/orders/cart", Some(&cookie), &json!({})))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["totalAmount"], 15_000);
    assert_eq!(h.store.cart_len(BUYER), 0);
}

#[tokio::test]
async fn test_direct_order_validation() {
    let h = harness(StubVerifier::failing("unused"));
    let product = h.store.add_product("Hanwoo sirloin 200g", 32_000);
    let cookie = h.login(BUYER, UserRole::User).await;

    let response = h
        .send(json_request(
            "POST",
            "/api/orders",
            Some(&cookie),
            &json!({ "productId": 99_999 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = h
        .send(json_request(
            "POST",
            "/api/orders",
            Some(&cookie),
            &json!({ "productId": product, "quantity": 0 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = h
        .send(json_request("POST", "/api/orders", Some(&cookie), &json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(h.store.order_count(), 0);

    let response = h
        .send(json_request(
            "POST",
            "/api/orders",
            Some(&cookie),
            &json!({ "productId": product }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["totalAmount"], 32_000);
}

#[tokio::test]
async fn test_orders_are_scoped_to_owner() {
    let h = harness(StubVerifier::failing("unused"));
    let product = h.store.add_product("Hanwoo sirloin 200g", 32_000);
    let buyer = h.login(BUYER, UserRole::User).await;
    let other = h.login(OTHER, UserRole::User).await;
    let admin = h.login(UserId::new(3_000), UserRole::Admin).await;

    let response = h
        .send(json_request(
            "POST",
            "/api/orders",
            Some(&buyer),
            &json!({ "productId": product, "quantity": 2 }),
        ))
        .await;
    let order_id = body_json(response).await["id"].as_i64().unwrap();
    let uri = format!("/api/orders/{order_id}");

    let response = h.send(get(&uri, Some(&other))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = h.send(get("/api/orders", Some(&other))).await;
    assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(0));

    let response = h
        .send(json_request("PATCH", &uri, Some(&other), &json!({ "status": "SHIPPED" })))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = h
        .send(json_request("PATCH", &uri, Some(&buyer), &json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = h
        .send(json_request("PATCH", &uri, Some(&admin), &json!({ "status": "SHIPPED" })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "SHIPPED");

    let response = h.send(get(&uri, Some(&buyer))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["items"][0]["price"], 32_000);
}

#[tokio::test]
async fn test_admin_users_requires_admin() {
    let h = harness(StubVerifier::failing("unused"));
    let cookie = h.login(BUYER, UserRole::User).await;

    let response = h.send(get("/api/admin/users", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = h.send(get("/api/admin/users", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_catalog_and_address_validation() {
    let h = harness(StubVerifier::failing("unused"));

    let response = h
        .send(json_request(
            "POST",
            "/api/products",
            None,
            &json!({ "name": "Brisket", "price": 5_000 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = h.login(BUYER, UserRole::User).await;
    let response = h
        .send(json_request(
            "POST",
            "/api/products",
            Some(&cookie),
            &json!({ "name": "Brisket", "price": 0 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = h
        .send(json_request(
            "POST",
            "/api/addresses",
            Some(&cookie),
            &json!({ "receiverName": "Kim", "phone": "010", "postalCode": "06236", "address1": "Seoul" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = h
        .send(json_request("POST", "/api/cart", Some(&cookie), &json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "productId is required");
}

#[tokio::test]
async fn test_oauth_login_redirects_with_state() {
    let h = harness(StubVerifier::failing("unused"));

    let response = h.send(get("/auth/kakao/login", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(location.starts_with("https://kauth.kakao.com/oauth/authorize?"));
    assert!(location.contains("client_id=kakao-client"));
    assert!(location.contains("state="));
    assert!(session_cookie(&response).is_some());
}

#[tokio::test]
async fn test_oauth_unknown_or_unconfigured_provider() {
    let h = harness(StubVerifier::failing("unused"));

    let response = h.send(get("/auth/github/login", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Only Kakao has credentials in the test config
    let response = h.send(get("/auth/google/login", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oauth_callback_rejects_wrong_state() {
    let h = harness(StubVerifier::failing("unused"));

    let response = h.send(get("/auth/kakao/login", None)).await;
    let cookie = session_cookie(&response).unwrap();

    let response = h
        .send(get("/auth/kakao/callback?code=abc&state=forged", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = h
        .send(get("/auth/kakao/callback?error=access_denied", None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
