//! # Checkout Policy
//!
//! Deployment-level settings that shape every checkout session and webhook
//! reconciliation. Loaded from `config/checkout.toml`; every field has a default
//! so an empty file (or no file) yields the standard storefront policy.
//!
//! ```toml
//! [checkout]
//! payment_method_types = ["card", "paypal"]
//! allowed_countries = ["US", "CA", "GB"]
//! billing_address_collection = "required"
//! session_record = "required"
//!
//! [webhook]
//! deduplicate_events = true
//! ```

use crate::error::{PaymentError, PaymentResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Checkout mode sent to the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// One-time payment
    #[default]
    Payment,
    /// Subscription
    Subscription,
    /// Setup (save card for later)
    Setup,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
            CheckoutMode::Subscription => "subscription",
            CheckoutMode::Setup => "setup",
        }
    }
}

/// Payment method types the hosted checkout page offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    Card,
    Paypal,
    Link,
    SepaDebit,
    Ideal,
    Bancontact,
    Klarna,
}

impl PaymentMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodType::Card => "card",
            PaymentMethodType::Paypal => "paypal",
            PaymentMethodType::Link => "link",
            PaymentMethodType::SepaDebit => "sepa_debit",
            PaymentMethodType::Ideal => "ideal",
            PaymentMethodType::Bancontact => "bancontact",
            PaymentMethodType::Klarna => "klarna",
        }
    }
}

/// ISO-3166 alpha-2 country code (two uppercase ASCII letters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(code: impl Into<String>) -> PaymentResult<Self> {
        let code = code.into();
        if code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(PaymentError::Configuration(format!(
                "invalid country code '{}': expected two uppercase letters",
                code
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CountryCode {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the hosted page must collect a billing address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingAddressCollection {
    Auto,
    #[default]
    Required,
}

impl BillingAddressCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingAddressCollection::Auto => "auto",
            BillingAddressCollection::Required => "required",
        }
    }
}

/// What to do when the provider session exists but recording it fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRecordPolicy {
    /// Fail the request; the provider session is left orphaned and logged.
    #[default]
    Required,
    /// Log the failure and still hand the redirect URL to the caller.
    BestEffort,
}

/// Countries shipped to when no policy file overrides them
pub const DEFAULT_SHIPPING_COUNTRIES: &[&str] = &[
    "US", "CA", "GB", "DE", "FR", "ES", "IT", "NL", "BE", "AT", "CH",
];

fn default_payment_method_types() -> Vec<PaymentMethodType> {
    vec![PaymentMethodType::Card, PaymentMethodType::Paypal]
}

fn default_allowed_countries() -> Vec<CountryCode> {
    DEFAULT_SHIPPING_COUNTRIES
        .iter()
        .map(|c| CountryCode((*c).to_string()))
        .collect()
}

/// Fixed parameters attached to every checkout session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutPolicy {
    pub mode: CheckoutMode,
    pub payment_method_types: Vec<PaymentMethodType>,
    pub allowed_countries: Vec<CountryCode>,
    pub billing_address_collection: BillingAddressCollection,
    pub session_record: SessionRecordPolicy,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            mode: CheckoutMode::Payment,
            payment_method_types: default_payment_method_types(),
            allowed_countries: default_allowed_countries(),
            billing_address_collection: BillingAddressCollection::Required,
            session_record: SessionRecordPolicy::Required,
        }
    }
}

/// Webhook reconciliation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookPolicy {
    /// Treat a redelivered event id as a no-op
    pub deduplicate_events: bool,
}

impl Default for WebhookPolicy {
    fn default() -> Self {
        Self {
            deduplicate_events: true,
        }
    }
}

/// All policies, as laid out in the TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policies {
    pub checkout: CheckoutPolicy,
    pub webhook: WebhookPolicy,
}

impl Policies {
    /// Parse from TOML
    pub fn from_toml(toml_str: &str) -> PaymentResult<Self> {
        let policies: Policies = toml::from_str(toml_str)
            .map_err(|e| PaymentError::Configuration(format!("invalid policy file: {}", e)))?;

        if policies.checkout.payment_method_types.is_empty() {
            return Err(PaymentError::Configuration(
                "payment_method_types must not be empty".to_string(),
            ));
        }

        Ok(policies)
    }
}
