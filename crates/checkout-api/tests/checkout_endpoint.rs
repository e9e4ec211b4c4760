mod common;

use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum_test::TestServer;
use checkout_api::checkout_router;
use checkout_core::{Policies, SessionRecordPolicy, SessionStatus};
use common::{test_state, SECRET_KEY, WEBHOOK_SECRET};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn checkout_body() -> Value {
    json!({
        "line_items": [
            {"price": "price_tee", "quantity": 2},
            {"price": "price_cap", "quantity": 1}
        ],
        "success_url": "https://shop.example/success",
        "cancel_url": "https://shop.example/cancel",
        "customer_email": "buyer@example.com",
        "metadata": {"cart_id": "cart_7"}
    })
}

fn stripe_session(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": id,
        "object": "checkout.session",
        "url": format!("https://checkout.stripe.com/c/pay/{}", id),
        "amount_total": 5200,
        "currency": "eur"
    }))
}

async fn mount_session(stripe: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(stripe_session(id))
        .mount(stripe)
        .await;
}

async fn expect_no_stripe_call(stripe: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(stripe_session("cs_never"))
        .expect(0)
        .mount(stripe)
        .await;
}

#[tokio::test]
async fn creates_session_and_records_row() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("payment_method_types%5B1%5D=paypal"))
        .and(body_string_contains("billing_address_collection=required"))
        .and(body_string_contains("line_items%5B1%5D%5Bquantity%5D=1"))
        .respond_with(stripe_session("cs_test_a1"))
        .expect(1)
        .mount(&stripe)
        .await;

    let (state, store) = test_state(&stripe.uri(), Some(SECRET_KEY), None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server.post("/").json(&checkout_body()).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({"url": "https://checkout.stripe.com/c/pay/cs_test_a1"}));

    let sessions = store.sessions();
    assert_eq!(sessions.len(), 1);
    let row = &sessions[0];
    assert_eq!(row.session_id, "cs_test_a1");
    assert_eq!(row.status, SessionStatus::Created);
    assert_eq!(row.amount_total, Some(5200));
    assert_eq!(row.currency.as_deref(), Some("eur"));
    assert_eq!(row.customer_email.as_deref(), Some("buyer@example.com"));
    assert_eq!(row.metadata, Some(json!({"cart_id": "cart_7"})));
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn missing_success_url_is_500_without_writes() {
    let stripe = MockServer::start().await;
    expect_no_stripe_call(&stripe).await;

    let (state, store) = test_state(&stripe.uri(), Some(SECRET_KEY), None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let mut body = checkout_body();
    body.as_object_mut().unwrap().remove("success_url");

    let response = server.post("/").json(&body).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert!(store.sessions().is_empty());
}

#[tokio::test]
async fn missing_cancel_url_is_500_without_writes() {
    let stripe = MockServer::start().await;
    expect_no_stripe_call(&stripe).await;

    let (state, store) = test_state(&stripe.uri(), Some(SECRET_KEY), None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let mut body = checkout_body();
    body.as_object_mut().unwrap().remove("cancel_url");

    let response = server.post("/").json(&body).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert!(store.sessions().is_empty());
}

#[tokio::test]
async fn unset_secret_key_is_500_before_any_network_call() {
    let stripe = MockServer::start().await;
    expect_no_stripe_call(&stripe).await;

    let (state, store) = test_state(&stripe.uri(), None, Some(WEBHOOK_SECRET), Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server.post("/").json(&checkout_body()).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Stripe secret key not configured"));
    assert!(store.sessions().is_empty());
}

#[tokio::test]
async fn unset_secret_key_is_reported_before_body_errors() {
    let stripe = MockServer::start().await;
    expect_no_stripe_call(&stripe).await;

    let (state, store) = test_state(&stripe.uri(), None, None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server.post("/").text("{\"line_items\": [").await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Stripe secret key not configured"));
    assert!(store.sessions().is_empty());
}

#[tokio::test]
async fn malformed_json_is_500() {
    let stripe = MockServer::start().await;
    expect_no_stripe_call(&stripe).await;

    let (state, store) = test_state(&stripe.uri(), Some(SECRET_KEY), None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server.post("/").text("{\"line_items\": [").await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(store.sessions().is_empty());
}

#[tokio::test]
async fn provider_error_is_500_with_status_code() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": {"message": "Your account cannot currently make live charges."}
        })))
        .expect(1)
        .mount(&stripe)
        .await;

    let (state, store) = test_state(&stripe.uri(), Some(SECRET_KEY), None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server.post("/").json(&checkout_body()).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("402"));
    assert!(store.sessions().is_empty());
}

#[tokio::test]
async fn empty_line_items_are_passed_through() {
    let stripe = MockServer::start().await;
    mount_session(&stripe, "cs_empty").await;

    let (state, store) = test_state(&stripe.uri(), Some(SECRET_KEY), None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server
        .post("/")
        .json(&json!({
            "line_items": [],
            "success_url": "https://shop.example/success",
            "cancel_url": "https://shop.example/cancel"
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(store.sessions().len(), 1);
    assert!(store.sessions()[0].customer_email.is_none());
}

#[tokio::test]
async fn record_failure_fails_request_by_default() {
    let stripe = MockServer::start().await;
    mount_session(&stripe, "cs_orphan").await;

    let (state, store) = test_state(&stripe.uri(), Some(SECRET_KEY), None, Policies::default());
    store.fail_writes(true);
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server.post("/").json(&checkout_body()).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Persistence"));
}

#[tokio::test]
async fn record_failure_is_tolerated_when_best_effort() {
    let stripe = MockServer::start().await;
    mount_session(&stripe, "cs_best_effort").await;

    let mut policies = Policies::default();
    policies.checkout.session_record = SessionRecordPolicy::BestEffort;
    let (state, store) = test_state(&stripe.uri(), Some(SECRET_KEY), None, policies);
    store.fail_writes(true);
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server.post("/").json(&checkout_body()).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["url"], "https://checkout.stripe.com/c/pay/cs_best_effort");
    assert!(store.sessions().is_empty());
}

#[tokio::test]
async fn identical_requests_create_independent_sessions() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(stripe_session("cs_first"))
        .up_to_n_times(1)
        .mount(&stripe)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(stripe_session("cs_second"))
        .mount(&stripe)
        .await;

    let (state, store) = test_state(&stripe.uri(), Some(SECRET_KEY), None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    server.post("/").json(&checkout_body()).await.assert_status_ok();
    server.post("/").json(&checkout_body()).await.assert_status_ok();

    let ids: Vec<String> = store.sessions().into_iter().map(|s| s.session_id).collect();
    assert_eq!(ids, vec!["cs_first", "cs_second"]);
}

#[tokio::test]
async fn options_is_empty_200_without_configuration() {
    let (state, _store) = test_state("http://127.0.0.1:1", None, None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server.method(Method::OPTIONS, "/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().is_empty());
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let (state, _store) = test_state("http://127.0.0.1:1", None, None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server
        .method(Method::OPTIONS, "/")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://shop.example"),
        )
        .add_header(
            HeaderName::from_static("access-control-request-method"),
            HeaderValue::from_static("POST"),
        )
        .add_header(
            HeaderName::from_static("access-control-request-headers"),
            HeaderValue::from_static("content-type,x-client-info"),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().is_empty());
    assert_eq!(response.header("access-control-allow-origin"), "*");
    let methods = response.header("access-control-allow-methods");
    assert!(methods.to_str().unwrap().contains("POST"));
}

#[tokio::test]
async fn error_responses_carry_cors_origin() {
    let (state, _store) = test_state("http://127.0.0.1:1", None, None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server
        .post("/")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://shop.example"),
        )
        .json(&checkout_body())
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.header("access-control-allow-origin"), "*");
}

#[tokio::test]
async fn health_reports_service() {
    let (state, _store) = test_state("http://127.0.0.1:1", None, None, Policies::default());
    let server = TestServer::new(checkout_router(state)).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}
