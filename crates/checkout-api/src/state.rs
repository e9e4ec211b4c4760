//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the payment provider, the checkout store, and the loaded policies.
//! Nothing here is mutable after startup.

use checkout_core::{
    BoxedCheckoutStore, BoxedPaymentProvider, MemoryStore, PaymentError, Policies,
};
use checkout_stripe::StripeCheckoutStrategy;
use checkout_supabase::{SupabaseConfig, SupabaseStore};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

/// Which `CheckoutStore` backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatastoreBackend {
    Supabase,
    Memory,
}

impl std::str::FromStr for DatastoreBackend {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(DatastoreBackend::Supabase),
            "memory" => Ok(DatastoreBackend::Memory),
            other => Err(PaymentError::Configuration(format!(
                "unknown DATASTORE '{}': expected supabase or memory",
                other
            ))),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Store backend
    pub datastore: DatastoreBackend,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env(default_port: u16) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let datastore = match std::env::var("DATASTORE") {
            Ok(value) => value.parse()?,
            Err(_) => DatastoreBackend::Supabase,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(default_port),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            datastore,
        })
    }

    /// Local development config on the given port
    pub fn local(port: u16) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            environment: "development".to_string(),
            datastore: DatastoreBackend::Memory,
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Hosted-checkout provider
    pub provider: BoxedPaymentProvider,
    /// Relational store for sessions and orders
    pub store: BoxedCheckoutStore,
    /// Checkout and webhook policies
    pub policies: Policies,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Build state from the environment: Stripe provider, configured store,
    /// and the policy file.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let policies = load_policies()?;

        let stripe = StripeCheckoutStrategy::from_env(policies.checkout.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        if stripe.config().secret_key.is_none() {
            tracing::warn!("STRIPE_SECRET_KEY not set; checkout requests will fail");
        }
        if stripe.config().webhook_secret.is_none() {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set; webhook requests will fail");
        }

        let store: BoxedCheckoutStore = match config.datastore {
            DatastoreBackend::Supabase => {
                let supabase = SupabaseConfig::from_env();
                if !supabase.is_configured() {
                    tracing::warn!("Supabase not configured; datastore writes will fail");
                }
                let store = SupabaseStore::new(supabase)
                    .map_err(|e| anyhow::anyhow!("Failed to initialize Supabase: {}", e))?;
                Arc::new(store)
            }
            DatastoreBackend::Memory => {
                tracing::warn!("Using in-memory datastore; rows are lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::from_parts(Arc::new(stripe), store, policies, config))
    }

    /// Assemble state from already-built components
    pub fn from_parts(
        provider: BoxedPaymentProvider,
        store: BoxedCheckoutStore,
        policies: Policies,
        config: AppConfig,
    ) -> Self {
        Self {
            provider,
            store,
            policies,
            config,
        }
    }
}

/// Load policies from `CHECKOUT_CONFIG` or `config/checkout.toml`
pub fn load_policies() -> anyhow::Result<Policies> {
    if let Ok(path) = std::env::var("CHECKOUT_CONFIG") {
        return read_policies(Path::new(&path));
    }

    let config_paths = [
        "config/checkout.toml",
        "../config/checkout.toml",
        "../../config/checkout.toml",
    ];

    for path in config_paths {
        let path = Path::new(path);
        if path.exists() {
            return read_policies(path);
        }
    }

    tracing::warn!("No checkout policy file found, using defaults");
    Ok(Policies::default())
}

fn read_policies(path: &Path) -> anyhow::Result<Policies> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let policies = Policies::from_toml(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
    tracing::info!(
        "Loaded checkout policy from {}: {} payment methods, {} shipping countries",
        path.display(),
        policies.checkout.payment_method_types.len(),
        policies.checkout.allowed_countries.len()
    );
    Ok(policies)
}
