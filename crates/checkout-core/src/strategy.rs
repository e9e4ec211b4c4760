//! # Payment Provider Trait
//!
//! Strategy trait for the hosted-checkout provider. The HTTP layer only talks
//! to `dyn PaymentProvider`, so tests and alternative providers can be swapped
//! in without touching the handlers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PaymentProvider (trait)                   │
//! │  ├── ensure_checkout_ready()                                │
//! │  ├── create_checkout()                                      │
//! │  ├── verify_webhook()                                       │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                    ┌───────┴───────┐
//!                    │StripeCheckout │
//!                    │   Strategy    │
//!                    └───────────────┘
//! ```

use crate::checkout::{CheckoutRequest, ProviderSession, WebhookEvent};
use crate::error::PaymentResult;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Fail with `PaymentError::Configuration` when the credential needed to
    /// create sessions is missing. Default: always ready.
    fn ensure_checkout_ready(&self) -> PaymentResult<()> {
        Ok(())
    }

    /// Create a hosted checkout session for the request.
    ///
    /// Fails with `PaymentError::Configuration` before any network call when
    /// the provider credential is missing.
    async fn create_checkout(&self, request: &CheckoutRequest) -> PaymentResult<ProviderSession>;

    /// Verify a webhook signature over the raw body and parse the event.
    ///
    /// # Arguments
    /// * `payload` - Raw webhook body bytes
    /// * `signature` - Signature header from the request
    async fn verify_webhook(&self, payload: &[u8], signature: &str)
        -> PaymentResult<WebhookEvent>;

    /// Get the provider name (for logging and routing).
    fn provider_name(&self) -> &'static str;

    /// Name of the header carrying the webhook signature.
    /// Default: `{provider_name}-signature`
    fn signature_header(&self) -> String {
        format!("{}-signature", self.provider_name())
    }
}

/// Type alias for a shared payment provider (dynamic dispatch)
pub type BoxedPaymentProvider = Arc<dyn PaymentProvider>;
