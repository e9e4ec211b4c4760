//! # checkout-stripe
//!
//! Stripe provider for the storefront checkout services.
//!
//! **StripeCheckoutStrategy** implements `PaymentProvider` over the Checkout
//! Sessions API:
//! - Line items reference existing Stripe prices
//! - Payment methods, shipping countries and billing address collection come
//!   from `CheckoutPolicy`
//! - Customer email prefill and metadata pass-through
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_stripe::StripeCheckoutStrategy;
//! use checkout_core::{CheckoutPolicy, CheckoutRequest, PaymentProvider};
//!
//! let strategy = StripeCheckoutStrategy::from_env(CheckoutPolicy::default())?;
//!
//! let session = strategy.create_checkout(&request).await?;
//!
//! // Redirect user to session.checkout_url
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use checkout_stripe::{dispatch_webhook_event, CheckoutCompletedData, WebhookHandler};
//!
//! struct MyHandler;
//!
//! #[async_trait]
//! impl WebhookHandler for MyHandler {
//!     async fn on_checkout_completed(&self, event: &WebhookEvent, data: CheckoutCompletedData) -> PaymentResult<()> {
//!         println!("Session {} paid!", data.session_id);
//!         Ok(())
//!     }
//! }
//!
//! // In your webhook endpoint:
//! let event = strategy.verify_webhook(payload, signature).await?;
//! dispatch_webhook_event(&MyHandler, &event).await?;
//! ```

pub mod checkout;
pub mod config;
pub mod webhook;

// Re-exports
pub use checkout::StripeCheckoutStrategy;
pub use config::StripeConfig;
pub use webhook::{
    dispatch_webhook_event, parse_event, signature_header, verify_signature,
    CheckoutCompletedData, LoggingWebhookHandler, WebhookHandler, HANDLED_WEBHOOK_EVENTS,
};
