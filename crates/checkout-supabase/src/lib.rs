//! # checkout-supabase
//!
//! `CheckoutStore` backed by a Supabase project.
//!
//! Apply `migrations/0001_checkout_tables.sql` to the project before use; it
//! creates `checkout_sessions`, `orders`, the `webhook_events` idempotency
//! ledger and the `complete_checkout_session` function.

pub mod config;
pub mod store;

pub use config::SupabaseConfig;
pub use store::SupabaseStore;
