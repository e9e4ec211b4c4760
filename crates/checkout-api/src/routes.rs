//! # Routes
//!
//! Axum router configuration. Each endpoint is its own service mounted at `/`:
//!
//! - Checkout:
//!   - POST    / - Create checkout session
//!   - GET     /health - Health check
//!
//! - Webhook:
//!   - POST    / - Provider webhook
//!   - GET     /health - Health check
//!
//! `CorsLayer` answers every OPTIONS request itself with an empty 200, before
//! routing, so neither router registers an OPTIONS handler.

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, Any, CorsLayer},
    trace::TraceLayer,
};

/// Request headers the storefront's Supabase client sends
fn client_headers() -> Vec<HeaderName> {
    vec![
        header::AUTHORIZATION,
        HeaderName::from_static("x-client-info"),
        HeaderName::from_static("apikey"),
        header::CONTENT_TYPE,
    ]
}

/// Any origin, the listed headers, POST and OPTIONS
fn cors(allowed_headers: Vec<HeaderName>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::list(allowed_headers))
}

/// Router for the checkout-session endpoint
pub fn checkout_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::create_checkout_session))
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors(client_headers())),
        )
        .with_state(state)
}

/// Router for the webhook endpoint
pub fn webhook_router(state: AppState) -> Router {
    let mut allowed_headers = client_headers();
    if let Ok(name) = HeaderName::try_from(state.provider.signature_header()) {
        allowed_headers.push(name);
    }

    Router::new()
        .route("/", post(handlers::receive_webhook))
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors(allowed_headers)),
        )
        .with_state(state)
}
