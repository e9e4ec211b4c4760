//! # Stripe Configuration
//!
//! Configuration management for Stripe integration.
//! Secrets are loaded from environment variables. A missing secret does not
//! stop the process from starting: the endpoint that needs it reports a
//! configuration error per request instead.

use checkout_core::{PaymentError, PaymentResult};
use std::env;
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
pub const DEFAULT_API_VERSION: &str = "2024-12-18.acacia";
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// Stripe API configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub secret_key: Option<String>,

    /// Webhook signing secret (whsec_...)
    pub webhook_secret: Option<String>,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,

    /// Maximum age of a webhook signature timestamp, in seconds
    pub webhook_tolerance_secs: u64,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Read env vars:
    /// - `STRIPE_SECRET_KEY`
    /// - `STRIPE_WEBHOOK_SECRET`
    /// - `STRIPE_API_BASE_URL` (optional)
    /// - `STRIPE_API_VERSION` (optional)
    /// - `STRIPE_WEBHOOK_TOLERANCE_SECS` (optional)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = non_empty_var("STRIPE_SECRET_KEY");
        let webhook_secret = non_empty_var("STRIPE_WEBHOOK_SECRET");

        if let Some(ref key) = secret_key {
            if !key.starts_with("sk_test_") && !key.starts_with("sk_live_") && !key.starts_with("rk_") {
                warn!("STRIPE_SECRET_KEY does not look like a Stripe secret key");
            }
        }

        if let Some(ref secret) = webhook_secret {
            if !secret.starts_with("whsec_") {
                warn!("STRIPE_WEBHOOK_SECRET should start with whsec_");
            }
        }

        Self {
            secret_key,
            webhook_secret,
            api_base_url: non_empty_var("STRIPE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_version: non_empty_var("STRIPE_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            webhook_tolerance_secs: parse_tolerance(
                non_empty_var("STRIPE_WEBHOOK_TOLERANCE_SECS").as_deref(),
            ),
        }
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret_key: Option<&str>, webhook_secret: Option<&str>) -> Self {
        Self {
            secret_key: secret_key.map(String::from),
            webhook_secret: webhook_secret.map(String::from),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
        }
    }

    /// Secret key, or a configuration error when unset
    pub fn require_secret_key(&self) -> PaymentResult<&str> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| PaymentError::Configuration("Stripe secret key not configured".to_string()))
    }

    /// Webhook secret, or a configuration error when unset
    pub fn require_webhook_secret(&self) -> PaymentResult<&str> {
        self.webhook_secret.as_deref().ok_or_else(|| {
            PaymentError::Configuration("Stripe webhook secret not configured".to_string())
        })
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key
            .as_deref()
            .is_some_and(|k| k.starts_with("sk_test_"))
    }

    /// Check if using live keys
    pub fn is_live_mode(&self) -> bool {
        self.secret_key
            .as_deref()
            .is_some_and(|k| k.starts_with("sk_live_"))
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> PaymentResult<String> {
        Ok(format!("Bearer {}", self.require_secret_key()?))
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set webhook timestamp tolerance
    pub fn with_webhook_tolerance(mut self, secs: u64) -> Self {
        self.webhook_tolerance_secs = secs;
        self
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Tolerance in seconds; anything but a non-negative integer falls back to the default
fn parse_tolerance(value: Option<&str>) -> u64 {
    let Some(value) = value else {
        return DEFAULT_WEBHOOK_TOLERANCE_SECS;
    };
    match value.trim().parse::<u64>() {
        Ok(secs) => secs,
        Err(_) => {
            warn!(
                "STRIPE_WEBHOOK_TOLERANCE_SECS={} is not a non-negative integer, using {}",
                value, DEFAULT_WEBHOOK_TOLERANCE_SECS
            );
            DEFAULT_WEBHOOK_TOLERANCE_SECS
        }
    }
}
