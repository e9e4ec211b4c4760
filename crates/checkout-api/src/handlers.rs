//! # Request Handlers
//!
//! Axum request handlers for the two endpoints.
//!
//! Failures never leak a per-variant status: the checkout endpoint answers
//! every failure with 500 and the webhook endpoint with 400, both with an
//! `{error}` body.

use crate::reconcile::ReconcilingWebhookHandler;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use checkout_core::{
    CheckoutRequest, CheckoutSessionRecord, PaymentError, PaymentResult, SessionRecordPolicy,
};
use checkout_stripe::dispatch_webhook_event;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

// =============================================================================
// Response Types
// =============================================================================

/// Create checkout response
#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    /// Hosted checkout URL (redirect user here)
    pub url: String,
}

/// Webhook acknowledgement
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, err: &PaymentError) -> ApiError {
    (status, Json(ErrorResponse::new(err.to_string())))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront-checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a hosted checkout session and return its redirect URL
#[instrument(skip(state, body), fields(body_len = body.len()))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreateCheckoutResponse>, ApiError> {
    create_checkout_internal(&state, &body)
        .await
        .map(Json)
        .map_err(|e| {
            error!(category = e.category(), "Error creating checkout session: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        })
}

async fn create_checkout_internal(
    state: &AppState,
    body: &[u8],
) -> PaymentResult<CreateCheckoutResponse> {
    state.provider.ensure_checkout_ready()?;
    let request = CheckoutRequest::from_json(body)?;

    let session = state.provider.create_checkout(&request).await?;

    let record = CheckoutSessionRecord::created(&session, &request);
    if let Err(e) = state.store.insert_session(&record).await {
        match state.policies.checkout.session_record {
            SessionRecordPolicy::Required => {
                error!(
                    "Provider session {} created but not recorded: {}",
                    session.session_id, e
                );
                return Err(e);
            }
            SessionRecordPolicy::BestEffort => {
                warn!(
                    "Provider session {} not recorded, returning it anyway: {}",
                    session.session_id, e
                );
            }
        }
    }

    info!("Created checkout session: {}", session.session_id);

    Ok(CreateCheckoutResponse {
        url: session.checkout_url,
    })
}

/// Receive a provider webhook and reconcile stored rows
#[instrument(skip(state, headers, body), fields(body_len = body.len()))]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    receive_webhook_internal(&state, &headers, &body)
        .await
        .map(|_| Json(WebhookAck { received: true }))
        .map_err(|e| {
            error!(category = e.category(), "Webhook error: {}", e);
            error_response(StatusCode::BAD_REQUEST, &e)
        })
}

async fn receive_webhook_internal(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> PaymentResult<()> {
    let header_name = state.provider.signature_header();
    let signature = headers
        .get(header_name.as_str())
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            PaymentError::WebhookVerificationFailed(format!("Missing {} header", header_name))
        })?;

    let event = state.provider.verify_webhook(body, signature).await?;

    info!(
        "Received webhook: type={}, id={}",
        event.raw_type,
        event.event_id.as_deref().unwrap_or("none")
    );

    let handler = ReconcilingWebhookHandler::new(
        state.store.clone(),
        state.policies.webhook.deduplicate_events,
    );
    dispatch_webhook_event(&handler, &event).await
}
