//! # Stripe Webhook Handling
//!
//! Signature verification, event parsing and dispatch for Stripe webhooks.
//!
//! The `Stripe-Signature` header has the form `t=<unix>,v1=<hex>[,v1=<hex>]`.
//! Each `v1` entry is an HMAC-SHA256 over `"<t>.<raw body>"` keyed with the
//! endpoint's signing secret; one matching entry within the timestamp
//! tolerance accepts the payload.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use checkout_core::{
    OrderRecord, OrderStatus, PaymentError, PaymentResult, SessionCompletion, WebhookEvent,
    WebhookEventType,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Events this service reacts to; enable these on the Stripe endpoint
pub const HANDLED_WEBHOOK_EVENTS: &[&str] = &[
    "checkout.session.completed",
    "payment_intent.succeeded",
    "payment_intent.payment_failed",
];

// =============================================================================
// Signature Verification
// =============================================================================

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> PaymentResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(PaymentError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn signed_payload_mac(secret: &str, timestamp: i64, payload: &[u8]) -> PaymentResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Internal(format!("HMAC key: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Verify a signature header against the raw body at the current time
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
    tolerance_secs: u64,
) -> PaymentResult<()> {
    verify_signature_at(secret, payload, header, tolerance_secs, Utc::now().timestamp())
}

/// Verify a signature header against the raw body as of `now`
pub fn verify_signature_at(
    secret: &str,
    payload: &[u8],
    header: &str,
    tolerance_secs: u64,
    now: i64,
) -> PaymentResult<()> {
    let parsed = parse_signature_header(header)?;

    if now.abs_diff(parsed.timestamp) > tolerance_secs {
        return Err(PaymentError::WebhookVerificationFailed(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let mac = signed_payload_mac(secret, parsed.timestamp, payload)?;

    // verify_slice compares in constant time
    let valid = parsed.signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if !valid {
        return Err(PaymentError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }

    Ok(())
}

/// Build a valid `Stripe-Signature` header for a payload
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> PaymentResult<String> {
    let mac = signed_payload_mac(secret, timestamp, payload)?;
    Ok(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    ))
}

// =============================================================================
// Event Parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    created: Option<i64>,
    // only checkout.session.completed needs a payload
    #[serde(default)]
    data: StripeEventData,
}

#[derive(Debug, Default, Deserialize)]
struct StripeEventData {
    #[serde(default)]
    object: serde_json::Value,
}

fn event_type_from_str(event_type: &str) -> WebhookEventType {
    match event_type {
        "checkout.session.completed" => WebhookEventType::CheckoutCompleted,
        "payment_intent.succeeded" => WebhookEventType::PaymentSucceeded,
        "payment_intent.payment_failed" => WebhookEventType::PaymentFailed,
        other => WebhookEventType::Unknown(other.to_string()),
    }
}

/// Parse a raw Stripe event envelope `{type, data: {object}}`
pub fn parse_event(payload: &[u8]) -> PaymentResult<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        PaymentError::WebhookParseError(format!("Failed to parse webhook: {}", e))
    })?;

    debug!("Parsed Stripe webhook: type={}", event.event_type);

    Ok(WebhookEvent {
        event_id: event.id,
        event_type: event_type_from_str(&event.event_type),
        raw_type: event.event_type,
        provider: "stripe".to_string(),
        object: event.data.object,
        created: event.created.and_then(|ts| DateTime::from_timestamp(ts, 0)),
    })
}

/// Parsed checkout.session.completed event data
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCompletedData {
    pub session_id: String,
    pub customer_email: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub payment_status: Option<String>,
    pub customer_details: Option<serde_json::Value>,
    pub shipping_details: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
}

fn present(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<serde_json::Value> {
    obj.get(key).filter(|v| !v.is_null()).cloned()
}

impl CheckoutCompletedData {
    /// Parse from a webhook event
    pub fn from_event(event: &WebhookEvent) -> PaymentResult<Self> {
        let obj = event.object.as_object().ok_or_else(|| {
            PaymentError::WebhookParseError("Event data object is not an object".to_string())
        })?;

        let session_id = obj
            .get("id")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| PaymentError::WebhookParseError("Missing session id".to_string()))?;

        let customer_details = present(obj, "customer_details");

        let customer_email = customer_details
            .as_ref()
            .and_then(|cd| cd.get("email"))
            .and_then(|v| v.as_str())
            .map(String::from);

        // newer API versions nest shipping under collected_information
        let shipping_details = present(obj, "shipping_details").or_else(|| {
            obj.get("collected_information")
                .and_then(|ci| ci.get("shipping_details"))
                .filter(|v| !v.is_null())
                .cloned()
        });

        Ok(Self {
            session_id,
            customer_email,
            amount_total: obj.get("amount_total").and_then(|v| v.as_i64()),
            currency: obj
                .get("currency")
                .and_then(|v| v.as_str())
                .map(String::from),
            payment_status: obj
                .get("payment_status")
                .and_then(|v| v.as_str())
                .map(String::from),
            customer_details,
            shipping_details,
            metadata: present(obj, "metadata"),
        })
    }

    /// Check if payment was successful
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }

    /// The session update and order insert this event implies
    pub fn into_completion(
        self,
        event_id: Option<String>,
        event_type: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> SessionCompletion {
        let order = OrderRecord {
            session_id: self.session_id.clone(),
            customer_email: self.customer_email,
            amount_total: self.amount_total,
            currency: self.currency,
            status: OrderStatus::Confirmed,
            shipping_details: self.shipping_details,
            metadata: self.metadata,
        };

        SessionCompletion {
            event_id,
            event_type: event_type.into(),
            session_id: self.session_id,
            payment_status: self.payment_status,
            customer_details: self.customer_details,
            updated_at,
            order,
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Webhook event handler trait
///
/// Implement this trait to react to webhook events. The defaults only log.
#[allow(unused_variables)]
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Called when a checkout session is completed
    async fn on_checkout_completed(
        &self,
        event: &WebhookEvent,
        data: CheckoutCompletedData,
    ) -> PaymentResult<()> {
        info!(
            "Checkout completed: session={}, amount={:?}",
            data.session_id, data.amount_total
        );
        Ok(())
    }

    /// Called when a payment succeeds
    async fn on_payment_succeeded(&self, event: &WebhookEvent) -> PaymentResult<()> {
        info!("Payment succeeded: {}", event.object_id().unwrap_or("unknown"));
        Ok(())
    }

    /// Called when a payment fails
    async fn on_payment_failed(&self, event: &WebhookEvent) -> PaymentResult<()> {
        warn!("Payment failed: {}", event.object_id().unwrap_or("unknown"));
        Ok(())
    }

    /// Called for unknown/unhandled events
    async fn on_unknown_event(&self, event: &WebhookEvent) -> PaymentResult<()> {
        info!("Unhandled event type: {}", event.raw_type);
        Ok(())
    }
}

/// Default webhook handler (just logs events)
pub struct LoggingWebhookHandler;

impl WebhookHandler for LoggingWebhookHandler {}

/// Dispatch a webhook event to the appropriate handler method
pub async fn dispatch_webhook_event(
    handler: &dyn WebhookHandler,
    event: &WebhookEvent,
) -> PaymentResult<()> {
    match &event.event_type {
        WebhookEventType::CheckoutCompleted => {
            let data = CheckoutCompletedData::from_event(event)?;
            handler.on_checkout_completed(event, data).await
        }
        WebhookEventType::PaymentSucceeded => handler.on_payment_succeeded(event).await,
        WebhookEventType::PaymentFailed => handler.on_payment_failed(event).await,
        WebhookEventType::Unknown(_) => handler.on_unknown_event(event).await,
    }
}
