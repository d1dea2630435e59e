//! Order lifecycle state machine
//!
//! Every status write that originates from an operator action goes through
//! [`StateMachine::transition`], which validates the target against the
//! allowed-successor table, persists atomically with a bumped sequence,
//! and broadcasts an [`OrderEvent`]. Transitions for one order are
//! serialized on a per-order lock; distinct orders proceed in parallel.
//!
//! # Successor table
//!
//! ```text
//! New        -> Kitchen | Void | Cancelled
//! Kitchen    -> Preparing | Void
//! Preparing  -> Ready | Void
//! Ready      -> Delivering | Completed | Void   (Delivering: Delivery orders only)
//! Delivering -> Completed | Void
//! Completed  -> Refunded
//! ```
//!
//! Anything not listed fails with [`TransitionError::InvalidTransition`]
//! and leaves the order untouched. The transition into `Kitchen` is the
//! kitchen-dispatch trigger; the print worker reacts to the broadcast
//! event, so dispatch is fire-and-forget for the caller.

use crate::store::{OrderStore, StoreError};
use dashmap::DashMap;
use shared::error::AppError;
use shared::models::{Order, OrderType};
use shared::order::{OrderEvent, OrderStatus, TransitionOrigin};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};

/// Lock map size warning threshold
const LOCK_MAP_WARN_THRESHOLD: usize = 1000;

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Order not found: local_id={0}")]
    OrderNotFound(i64),

    #[error("Invalid transition: {from:?} -> {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Concurrent update lost: local_id={0}")]
    Conflict(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

pub type TransitionResult<T> = Result<T, TransitionError>;

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        use shared::error::ErrorCode;
        match err {
            TransitionError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("local_id={}", id))
            }
            TransitionError::InvalidTransition { from, to } => AppError::with_message(
                ErrorCode::InvalidTransition,
                format!("{:?} -> {:?}", from, to),
            ),
            TransitionError::Conflict(id) => {
                AppError::with_message(ErrorCode::StaleSequence, format!("local_id={}", id))
            }
            TransitionError::Storage(e) => e.into(),
        }
    }
}

/// Check the allowed-successor table
///
/// `Delivering` is only reachable for delivery orders; everything else is
/// a pure function of the (from, to) pair.
pub fn is_allowed(from: OrderStatus, to: OrderStatus, order_type: OrderType) -> bool {
    use OrderStatus::*;
    match (from, to) {
        (New, Kitchen) | (New, Void) | (New, Cancelled) => true,
        (Kitchen, Preparing) | (Kitchen, Void) => true,
        (Preparing, Ready) | (Preparing, Void) => true,
        (Ready, Delivering) => order_type == OrderType::Delivery,
        (Ready, Completed) | (Ready, Void) => true,
        (Delivering, Completed) | (Delivering, Void) => true,
        (Completed, Refunded) => true,
        _ => false,
    }
}

/// Order lifecycle state machine
pub struct StateMachine {
    store: Arc<dyn OrderStore>,
    event_tx: broadcast::Sender<OrderEvent>,
    /// Per-order transition locks, keyed by local_id
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl StateMachine {
    /// Create a state machine over the given store
    pub fn new(store: Arc<dyn OrderStore>, event_channel_capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(event_channel_capacity);
        Self {
            store,
            event_tx,
            locks: DashMap::new(),
        }
    }

    /// Subscribe to transition events
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    /// Event sender, shared with the sync coordinator so sync-applied
    /// status changes flow through the same stream
    pub fn event_sender(&self) -> broadcast::Sender<OrderEvent> {
        self.event_tx.clone()
    }

    fn order_lock(&self, local_id: i64) -> Arc<Mutex<()>> {
        let lock = self
            .locks
            .entry(local_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        if self.locks.len() > LOCK_MAP_WARN_THRESHOLD {
            tracing::warn!(
                lock_count = self.locks.len(),
                "Transition lock map exceeds threshold, possible order leak"
            );
        }
        lock
    }

    /// Apply a status transition
    ///
    /// Succeeds only if `target` is in the allowed-successor set of the
    /// order's current status; otherwise fails with `InvalidTransition`
    /// and the order is unchanged. On success the order is persisted with
    /// `sequence + 1`, `updated_at` stamped, and an event broadcast.
    pub async fn transition(
        &self,
        local_id: i64,
        target: OrderStatus,
    ) -> TransitionResult<Order> {
        let lock = self.order_lock(local_id);
        let _guard = lock.lock().await;

        let order = self
            .store
            .get_by_local_id(local_id)
            .await?
            .ok_or(TransitionError::OrderNotFound(local_id))?;

        if !is_allowed(order.status, target, order.order_type) {
            tracing::debug!(
                local_id,
                order_id = %order.order_id,
                from = ?order.status,
                to = ?target,
                "Transition rejected"
            );
            return Err(TransitionError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }

        let next_sequence = order.sequence + 1;
        let applied = self
            .store
            .update_status(local_id, target, next_sequence)
            .await?;
        if !applied {
            // A sync merge slipped in with a higher sequence between our
            // read and write. The per-order lock only covers operator
            // callers, so surface it as a conflict instead of guessing.
            return Err(TransitionError::Conflict(local_id));
        }

        let event = OrderEvent::new(
            local_id,
            order.order_id.clone(),
            order.source_channel,
            order.status,
            target,
            next_sequence,
            TransitionOrigin::Operator,
        );
        // Receivers may come and go; a send error just means nobody is
        // listening right now.
        let _ = self.event_tx.send(event);

        tracing::info!(
            local_id,
            order_id = %order.order_id,
            from = ?order.status,
            to = ?target,
            sequence = next_sequence,
            "Order transitioned"
        );

        if target.is_terminal() {
            self.locks.remove(&local_id);
        }

        let updated = self
            .store
            .get_by_local_id(local_id)
            .await?
            .ok_or(TransitionError::OrderNotFound(local_id))?;
        Ok(updated)
    }
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("locks", &self.locks.len())
            .finish()
    }
}
