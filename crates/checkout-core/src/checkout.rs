//! # Checkout Types
//!
//! Inbound checkout requests, the session a provider hands back, and the
//! provider-neutral webhook event.

use crate::error::{PaymentError, PaymentResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A provider-recognized price reference plus quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Provider price identifier (e.g. `price_1Nx...`)
    pub price: String,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(price: impl Into<String>, quantity: u32) -> Self {
        Self {
            price: price.into(),
            quantity,
        }
    }
}

/// Body of a create-checkout-session call from the storefront
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Items to purchase; an empty list is forwarded as-is
    pub line_items: Vec<LineItem>,

    /// Absolute URL the provider redirects to after payment
    pub success_url: String,

    /// Absolute URL the provider redirects to on cancel
    pub cancel_url: String,

    /// Customer email (optional, for prefill)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// Opaque key/value pairs, forwarded to the provider and stored verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl CheckoutRequest {
    pub fn new(success_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        Self {
            line_items: Vec::new(),
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
            customer_email: None,
            metadata: None,
        }
    }

    /// Parse and validate a raw JSON body
    pub fn from_json(body: &[u8]) -> PaymentResult<Self> {
        let request: CheckoutRequest = serde_json::from_slice(body)
            .map_err(|e| PaymentError::InvalidRequest(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// Check the fields serde cannot express
    pub fn validate(&self) -> PaymentResult<()> {
        if self.success_url.trim().is_empty() {
            return Err(PaymentError::InvalidRequest(
                "success_url is required".to_string(),
            ));
        }
        if self.cancel_url.trim().is_empty() {
            return Err(PaymentError::InvalidRequest(
                "cancel_url is required".to_string(),
            ));
        }
        if let Some(item) = self.line_items.iter().find(|item| item.quantity == 0) {
            return Err(PaymentError::InvalidRequest(format!(
                "quantity for price {} must be at least 1",
                item.price
            )));
        }
        Ok(())
    }

    /// Add a line item
    pub fn with_item(mut self, price: impl Into<String>, quantity: u32) -> Self {
        self.line_items.push(LineItem::new(price, quantity));
        self
    }

    /// Set customer email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// A hosted checkout session created by a payment provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSession {
    /// Provider's session ID
    pub session_id: String,

    /// Provider name (e.g., "stripe")
    pub provider: String,

    /// URL to redirect customer to for payment
    pub checkout_url: String,

    /// Total in the smallest currency unit, as computed by the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_total: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Webhook event types the receiver distinguishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// Checkout session completed
    CheckoutCompleted,
    /// Payment succeeded
    PaymentSucceeded,
    /// Payment failed
    PaymentFailed,
    /// Anything else (passthrough)
    Unknown(String),
}

/// A verified, parsed webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID from provider; absent in hand-built payloads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    pub event_type: WebhookEventType,

    /// The event type string exactly as the provider sent it
    pub raw_type: String,

    /// Provider name
    pub provider: String,

    /// Event-specific payload (`data.object`)
    pub object: serde_json::Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl WebhookEvent {
    /// `id` of the event's payload object
    pub fn object_id(&self) -> Option<&str> {
        self.object.get("id").and_then(|v| v.as_str())
    }
}
