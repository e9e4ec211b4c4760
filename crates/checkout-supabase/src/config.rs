//! # Supabase Configuration
//!
//! Project URL and service-role key, loaded from the environment.

use checkout_core::{PaymentError, PaymentResult};
use std::env;

/// Supabase project configuration
#[derive(Debug, Clone, Default)]
pub struct SupabaseConfig {
    /// Project URL (https://<ref>.supabase.co)
    pub url: Option<String>,

    /// Service-role key; bypasses row level security
    pub service_role_key: Option<String>,
}

impl SupabaseConfig {
    /// Load configuration from environment variables.
    ///
    /// Read env vars:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_SERVICE_ROLE_KEY`
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            url: env::var("SUPABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    /// Create config with explicit values (for testing)
    pub fn new(url: impl Into<String>, service_role_key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            service_role_key: Some(service_role_key.into()),
        }
    }

    /// Base REST URL (`<url>/rest/v1`), or a configuration error when unset
    pub fn rest_base(&self) -> PaymentResult<String> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| PaymentError::Configuration("SUPABASE_URL not set".to_string()))?;
        Ok(format!("{}/rest/v1", url.trim_end_matches('/')))
    }

    /// Service-role key, or a configuration error when unset
    pub fn require_key(&self) -> PaymentResult<&str> {
        self.service_role_key.as_deref().ok_or_else(|| {
            PaymentError::Configuration("SUPABASE_SERVICE_ROLE_KEY not set".to_string())
        })
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.service_role_key.is_some()
    }
}
