//! # checkout-api
//!
//! HTTP layer for the storefront checkout services.
//!
//! This crate provides:
//! - Axum routers for the two endpoints
//! - Webhook reconciliation into the checkout store
//! - Configuration and logging bootstrap for the binaries
//!
//! ## Endpoints
//!
//! | Binary | Method | Path | Description |
//! |--------|--------|------|-------------|
//! | `create-checkout-session` | POST | `/` | Create checkout session, returns `{url}` |
//! | `stripe-webhook` | POST | `/` | Stripe webhook, returns `{received: true}` |
//! | both | OPTIONS | `/` | CORS preflight (answered by the CORS layer) |
//! | both | GET | `/health` | Health check |

pub mod handlers;
pub mod reconcile;
pub mod routes;
pub mod server;
pub mod state;

pub use routes::{checkout_router, webhook_router};
pub use state::{AppConfig, AppState, DatastoreBackend};
