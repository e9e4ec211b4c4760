//! # Persisted Rows
//!
//! Shapes of the `checkout_sessions` and `orders` tables, and the unit of work
//! a completion event applies to them.

use crate::checkout::{CheckoutRequest, ProviderSession};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a checkout session row: `created -> completed`, never back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Created,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Created => "created",
            SessionStatus::Completed => "completed",
        }
    }

    /// Whether a row in this state may be moved to `next`
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Created, SessionStatus::Completed)
                | (SessionStatus::Completed, SessionStatus::Completed)
        )
    }
}

/// A `checkout_sessions` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSessionRecord {
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_total: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    pub status: SessionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_details: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CheckoutSessionRecord {
    /// Row written right after the provider accepted the session
    pub fn created(session: &ProviderSession, request: &CheckoutRequest) -> Self {
        Self {
            session_id: session.session_id.clone(),
            customer_email: request.customer_email.clone(),
            amount_total: session.amount_total,
            currency: session.currency.clone(),
            status: SessionStatus::Created,
            payment_status: None,
            customer_details: None,
            metadata: request
                .metadata
                .as_ref()
                .and_then(|m| serde_json::to_value(m).ok()),
            updated_at: None,
        }
    }
}

/// Orders are created confirmed and never change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Confirmed,
}

/// An `orders` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub session_id: String,

    #[serde(default)]
    pub customer_email: Option<String>,

    #[serde(default)]
    pub amount_total: Option<i64>,

    #[serde(default)]
    pub currency: Option<String>,

    pub status: OrderStatus,

    #[serde(default)]
    pub shipping_details: Option<serde_json::Value>,

    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Everything a `checkout.session.completed` event writes, applied as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCompletion {
    /// Ledger key; `None` disables deduplication for this delivery
    pub event_id: Option<String>,

    pub event_type: String,

    pub session_id: String,

    pub payment_status: Option<String>,

    pub customer_details: Option<serde_json::Value>,

    pub updated_at: DateTime<Utc>,

    pub order: OrderRecord,
}

/// Result of applying a [`SessionCompletion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Order inserted; `sessions_updated` is 0 when no session row matched
    Applied { sessions_updated: u64 },
    /// Event id already in the ledger; nothing written
    Duplicate,
}
