//! # stripe-webhook
//!
//! Receives Stripe webhooks and reconciles checkout sessions and orders.
//!
//! ## Usage
//!
//! ```bash
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//! export SUPABASE_URL=https://<ref>.supabase.co
//! export SUPABASE_SERVICE_ROLE_KEY=...
//!
//! stripe-webhook
//! ```

use checkout_api::{routes, server, AppConfig, AppState};
use checkout_stripe::HANDLED_WEBHOOK_EVENTS;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::init_tracing();

    let config = AppConfig::from_env(8081)?;
    let state = AppState::new(config)?;
    let addr = state.config.socket_addr()?;

    info!("Environment: {}", state.config.environment);
    info!("Datastore: {}", state.store.backend_name());
    info!("Handled events: {}", HANDLED_WEBHOOK_EVENTS.join(", "));
    info!(
        "Event deduplication: {}",
        if state.policies.webhook.deduplicate_events { "on" } else { "off" }
    );

    if !state.config.is_production() {
        info!("Webhook: POST http://{}/", addr);
        info!("Local forwarding: stripe listen --forward-to http://{}/", addr);
    }

    server::serve(routes::webhook_router(state), addr).await
}
