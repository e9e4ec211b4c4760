//! # Checkout Store
//!
//! Persistence seam for the `checkout_sessions` and `orders` tables.
//!
//! Both handlers are stateless: each request performs one call on the store.
//! `complete_session` is a single unit of work so the session update, the
//! order insert and the idempotency ledger entry apply together or not at all.

use crate::error::{PaymentError, PaymentResult};
use crate::record::{
    CheckoutSessionRecord, CompletionOutcome, OrderRecord, SessionCompletion, SessionStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Insert a freshly created session row
    async fn insert_session(&self, record: &CheckoutSessionRecord) -> PaymentResult<()>;

    /// Mark the session completed and insert its order as one unit.
    ///
    /// A missing session row is not an error: the update touches zero rows
    /// and the order is still created.
    async fn complete_session(
        &self,
        completion: &SessionCompletion,
    ) -> PaymentResult<CompletionOutcome>;

    /// Backend name (for logging)
    fn backend_name(&self) -> &'static str;
}

/// Type alias for a shared store (dynamic dispatch)
pub type BoxedCheckoutStore = Arc<dyn CheckoutStore>;

/// An order row as held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrder {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub order: OrderRecord,
}

#[derive(Debug, Default)]
struct Tables {
    sessions: Vec<CheckoutSessionRecord>,
    orders: Vec<StoredOrder>,
    processed_events: HashSet<String>,
}

/// Process-local store for development and tests.
///
/// All tables sit behind one mutex, which makes `complete_session` atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a persistence error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the `checkout_sessions` table
    pub fn sessions(&self) -> Vec<CheckoutSessionRecord> {
        self.lock().map(|t| t.sessions.clone()).unwrap_or_default()
    }

    /// Snapshot of the `orders` table
    pub fn orders(&self) -> Vec<StoredOrder> {
        self.lock().map(|t| t.orders.clone()).unwrap_or_default()
    }

    pub fn session(&self, session_id: &str) -> Option<CheckoutSessionRecord> {
        self.sessions()
            .into_iter()
            .find(|s| s.session_id == session_id)
    }

    fn lock(&self) -> PaymentResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PaymentError::Internal("memory store lock poisoned".to_string()))
    }

    fn check_writable(&self) -> PaymentResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PaymentError::Persistence(
                "memory store is rejecting writes".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
    async fn insert_session(&self, record: &CheckoutSessionRecord) -> PaymentResult<()> {
        self.check_writable()?;
        let mut tables = self.lock()?;

        if tables
            .sessions
            .iter()
            .any(|s| s.session_id == record.session_id)
        {
            return Err(PaymentError::Persistence(format!(
                "duplicate key value violates unique constraint: session_id={}",
                record.session_id
            )));
        }

        tables.sessions.push(record.clone());
        Ok(())
    }

    async fn complete_session(
        &self,
        completion: &SessionCompletion,
    ) -> PaymentResult<CompletionOutcome> {
        self.check_writable()?;
        let mut tables = self.lock()?;

        if let Some(event_id) = &completion.event_id {
            if tables.processed_events.contains(event_id) {
                return Ok(CompletionOutcome::Duplicate);
            }
            tables.processed_events.insert(event_id.clone());
        }

        let mut sessions_updated = 0;
        for row in tables
            .sessions
            .iter_mut()
            .filter(|s| s.session_id == completion.session_id)
        {
            if row.status.can_transition_to(SessionStatus::Completed) {
                row.status = SessionStatus::Completed;
                row.payment_status = completion.payment_status.clone();
                row.customer_details = completion.customer_details.clone();
                row.updated_at = Some(completion.updated_at);
                sessions_updated += 1;
            }
        }

        tables.orders.push(StoredOrder {
            id: Uuid::new_v4(),
            created_at: completion.updated_at,
            order: completion.order.clone(),
        });

        Ok(CompletionOutcome::Applied { sessions_updated })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
