//! # Payment Error Types
//!
//! Typed error handling for the checkout services.
//! All provider and datastore operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for checkout and webhook processing
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid policy file)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider or datastore
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// Datastore rejected a write
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Stable label for the error taxonomy, used as a log field
    pub fn category(&self) -> &'static str {
        match self {
            PaymentError::Configuration(_) => "configuration",
            PaymentError::InvalidRequest(_) => "malformed_input",
            PaymentError::ProviderError { .. } => "upstream_provider",
            PaymentError::NetworkError(_) => "network",
            PaymentError::WebhookVerificationFailed(_) => "signature",
            PaymentError::WebhookParseError(_) => "malformed_input",
            PaymentError::Persistence(_) => "persistence",
            PaymentError::Serialization(_) => "serialization",
            PaymentError::Internal(_) => "internal",
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
