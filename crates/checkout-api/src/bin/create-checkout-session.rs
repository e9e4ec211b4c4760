//! # create-checkout-session
//!
//! Creates hosted Stripe checkout sessions for the storefront.
//!
//! ## Usage
//!
//! ```bash
//! export STRIPE_SECRET_KEY=sk_test_...
//! export SUPABASE_URL=https://<ref>.supabase.co
//! export SUPABASE_SERVICE_ROLE_KEY=...
//!
//! create-checkout-session
//! ```

use checkout_api::{routes, server, AppConfig, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::init_tracing();

    let config = AppConfig::from_env(8080)?;
    let state = AppState::new(config)?;
    let addr = state.config.socket_addr()?;

    info!("Environment: {}", state.config.environment);
    info!("Datastore: {}", state.store.backend_name());
    info!(
        "Checkout policy: mode={}, payment methods={:?}, shipping countries={}",
        state.policies.checkout.mode.as_str(),
        state.policies.checkout.payment_method_types,
        state.policies.checkout.allowed_countries.len()
    );

    if !state.config.is_production() {
        info!("Checkout: POST http://{}/", addr);
    }

    server::serve(routes::checkout_router(state), addr).await
}
