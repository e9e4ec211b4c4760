//! # checkout-core
//!
//! Core types and traits for the storefront checkout services.
//!
//! This crate provides:
//! - `CheckoutRequest`, `ProviderSession` and `WebhookEvent` for the two endpoints
//! - `CheckoutSessionRecord`, `OrderRecord` and `SessionCompletion` for persisted rows
//! - `PaymentProvider` trait for the hosted-checkout provider
//! - `CheckoutStore` trait plus `MemoryStore` for the relational store
//! - `Policies` for deployment-level checkout and webhook settings
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{CheckoutRequest, CheckoutSessionRecord, PaymentProvider, CheckoutStore};
//!
//! let request = CheckoutRequest::new("https://shop.example/success", "https://shop.example/cancel")
//!     .with_item("price_1Nx", 2);
//!
//! let session = provider.create_checkout(&request).await?;
//! store.insert_session(&CheckoutSessionRecord::created(&session, &request)).await?;
//!
//! // Redirect user to session.checkout_url
//! ```

pub mod checkout;
pub mod error;
pub mod policy;
pub mod record;
pub mod store;
pub mod strategy;

// Re-exports for convenience
pub use checkout::{CheckoutRequest, LineItem, ProviderSession, WebhookEvent, WebhookEventType};
pub use error::{PaymentError, PaymentResult};
pub use policy::{
    BillingAddressCollection, CheckoutMode, CheckoutPolicy, CountryCode, PaymentMethodType,
    Policies, SessionRecordPolicy, WebhookPolicy,
};
pub use record::{
    CheckoutSessionRecord, CompletionOutcome, OrderRecord, OrderStatus, SessionCompletion,
    SessionStatus,
};
pub use store::{BoxedCheckoutStore, CheckoutStore, MemoryStore, StoredOrder};
pub use strategy::{BoxedPaymentProvider, PaymentProvider};
