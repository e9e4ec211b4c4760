#![allow(dead_code)]

use checkout_api::{AppConfig, AppState};
use checkout_core::{BoxedCheckoutStore, MemoryStore, Policies};
use checkout_stripe::{StripeCheckoutStrategy, StripeConfig};
use std::sync::Arc;

pub const SECRET_KEY: &str = "sk_test_checkout";
pub const WEBHOOK_SECRET: &str = "whsec_test_webhook";

/// State wired to a (mock) Stripe base URL and an in-memory store
pub fn test_state(
    stripe_base_url: &str,
    secret_key: Option<&str>,
    webhook_secret: Option<&str>,
    policies: Policies,
) -> (AppState, Arc<MemoryStore>) {
    let config = StripeConfig::new(secret_key, webhook_secret).with_api_base_url(stripe_base_url);
    let provider = StripeCheckoutStrategy::new(config, policies.checkout.clone()).unwrap();
    let store = Arc::new(MemoryStore::new());
    let boxed_store: BoxedCheckoutStore = store.clone();

    let state = AppState::from_parts(
        Arc::new(provider),
        boxed_store,
        policies,
        AppConfig::local(0),
    );
    (state, store)
}
