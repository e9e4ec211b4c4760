//! # Supabase Store
//!
//! `CheckoutStore` over the Supabase REST interface (PostgREST).
//!
//! Session rows are inserted directly into `checkout_sessions`. Completion
//! events go through the `complete_checkout_session` SQL function (see
//! `migrations/0001_checkout_tables.sql`), which runs the ledger insert,
//! session update and order insert in one transaction.

use crate::config::SupabaseConfig;
use async_trait::async_trait;
use checkout_core::{
    CheckoutSessionRecord, CheckoutStore, CompletionOutcome, OrderRecord, PaymentError,
    PaymentResult, SessionCompletion,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

pub struct SupabaseStore {
    config: SupabaseConfig,
    client: Client,
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| PaymentError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        Self::new(SupabaseConfig::from_env())
    }

    /// POST to a REST path with the service-role credentials attached
    fn post(&self, path: &str) -> PaymentResult<RequestBuilder> {
        let url = format!("{}/{}", self.config.rest_base()?, path);
        let key = self.config.require_key()?;

        Ok(self
            .client
            .post(url)
            .header("apikey", key)
            .header("Authorization", format!("Bearer {}", key)))
    }

    async fn check(response: Response, operation: &str) -> PaymentResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Supabase {} failed: status={}, body={}", operation, status, body);

        Err(PaymentError::Persistence(format!(
            "{} failed: {}: {}",
            operation,
            status.as_u16(),
            body
        )))
    }
}

#[derive(Debug, Serialize)]
struct CompleteSessionArgs<'a> {
    p_event_id: Option<&'a str>,
    p_event_type: &'a str,
    p_session_id: &'a str,
    p_payment_status: Option<&'a str>,
    p_customer_details: Option<&'a serde_json::Value>,
    p_updated_at: DateTime<Utc>,
    p_order: &'a OrderRecord,
}

#[derive(Debug, Deserialize)]
struct CompleteSessionResult {
    #[serde(default)]
    duplicate: bool,
    #[serde(default)]
    sessions_updated: u64,
}

#[async_trait]
impl CheckoutStore for SupabaseStore {
    #[instrument(skip(self, record), fields(session_id = %record.session_id))]
    async fn insert_session(&self, record: &CheckoutSessionRecord) -> PaymentResult<()> {
        let response = self
            .post("checkout_sessions")?
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        Self::check(response, "insert into checkout_sessions").await?;
        debug!("Recorded checkout session {}", record.session_id);
        Ok(())
    }

    #[instrument(skip(self, completion), fields(session_id = %completion.session_id))]
    async fn complete_session(
        &self,
        completion: &SessionCompletion,
    ) -> PaymentResult<CompletionOutcome> {
        let args = CompleteSessionArgs {
            p_event_id: completion.event_id.as_deref(),
            p_event_type: &completion.event_type,
            p_session_id: &completion.session_id,
            p_payment_status: completion.payment_status.as_deref(),
            p_customer_details: completion.customer_details.as_ref(),
            p_updated_at: completion.updated_at,
            p_order: &completion.order,
        };

        let response = self
            .post("rpc/complete_checkout_session")?
            .json(&args)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let response = Self::check(response, "complete_checkout_session").await?;
        let result: CompleteSessionResult = response.json().await.map_err(|e| {
            PaymentError::Serialization(format!("complete_checkout_session result: {}", e))
        })?;

        if result.duplicate {
            Ok(CompletionOutcome::Duplicate)
        } else {
            Ok(CompletionOutcome::Applied {
                sessions_updated: result.sessions_updated,
            })
        }
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}
