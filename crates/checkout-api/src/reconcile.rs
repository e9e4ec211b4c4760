//! # Webhook Reconciliation
//!
//! `WebhookHandler` that turns provider events into datastore writes.
//! Only `checkout.session.completed` writes anything; payment intent and
//! unknown events keep the logging defaults.

use async_trait::async_trait;
use checkout_core::{BoxedCheckoutStore, CompletionOutcome, PaymentResult, WebhookEvent};
use checkout_stripe::{CheckoutCompletedData, WebhookHandler};
use chrono::Utc;
use tracing::{info, warn};

pub struct ReconcilingWebhookHandler {
    store: BoxedCheckoutStore,
    deduplicate_events: bool,
}

impl ReconcilingWebhookHandler {
    pub fn new(store: BoxedCheckoutStore, deduplicate_events: bool) -> Self {
        Self {
            store,
            deduplicate_events,
        }
    }
}

#[async_trait]
impl WebhookHandler for ReconcilingWebhookHandler {
    async fn on_checkout_completed(
        &self,
        event: &WebhookEvent,
        data: CheckoutCompletedData,
    ) -> PaymentResult<()> {
        let event_id = if self.deduplicate_events {
            event.event_id.clone()
        } else {
            None
        };

        let session_id = data.session_id.clone();
        let completion = data.into_completion(event_id, &event.raw_type, Utc::now());

        match self.store.complete_session(&completion).await? {
            CompletionOutcome::Applied { sessions_updated } => {
                if sessions_updated == 0 {
                    warn!("No checkout session row for {}; recording order anyway", session_id);
                }
                info!("Order created for session: {}", session_id);
            }
            CompletionOutcome::Duplicate => {
                info!(
                    "Event {} already processed; skipping session {}",
                    event.event_id.as_deref().unwrap_or("unknown"),
                    session_id
                );
            }
        }

        Ok(())
    }
}
