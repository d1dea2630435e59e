//! Sync coordinator - merges remote orders into the local store
//!
//! The merge is idempotent on the `(source_channel, order_id)` natural
//! key and serialized per key through a lock map, so the push and poll
//! transports can fire concurrently without a double-create race. Status
//! reconciliation is last-writer-wins strictly by sequence number - never
//! wall-clock - so clock skew between the till and the cloud cannot roll
//! an order backwards.

use crate::store::{OrderStore, StoreError};
use dashmap::DashMap;
use shared::error::AppError;
use shared::models::{Order, RemoteOrder, SourceChannel};
use shared::order::{OrderEvent, OrderStatus, TransitionOrigin};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Malformed remote order {order_id}: {reason}")]
    Malformed { order_id: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

pub type SyncResult<T> = Result<T, SyncError>;

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        use shared::error::ErrorCode;
        match err {
            SyncError::Malformed { order_id, reason } => {
                AppError::with_message(ErrorCode::MalformedRemoteOrder, reason)
                    .with_detail("order_id", order_id)
            }
            SyncError::Storage(e) => e.into(),
        }
    }
}

/// What a single merge did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First sight of this order; created locally
    Created { local_id: i64 },
    /// Known order updated from the remote report
    Updated { local_id: i64 },
    /// Remote report was not newer than local state; ignored
    StaleIgnored,
}

/// Summary of one merge batch
///
/// `skipped` holds malformed payloads - data errors that retrying cannot
/// fix, so they do not hold the cursor back. `failed` holds retryable
/// errors (storage); any entry here blocks the cursor from advancing.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub created: usize,
    pub updated: usize,
    pub stale: usize,
    pub skipped: Vec<(String, String)>,
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    /// Whether the cursor may advance past this batch
    pub fn clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn merged(&self) -> usize {
        self.created + self.updated
    }
}

/// Remote order merge coordinator
pub struct SyncCoordinator {
    store: Arc<dyn OrderStore>,
    event_tx: broadcast::Sender<OrderEvent>,
    /// Single-writer-per-key merge locks
    merge_locks: DashMap<(SourceChannel, String), Arc<Mutex<()>>>,
}

impl SyncCoordinator {
    /// Create a coordinator sharing the lifecycle event stream
    ///
    /// Sync-applied status changes are broadcast on the same channel as
    /// operator transitions so kitchen dispatch has one entry point.
    pub fn new(store: Arc<dyn OrderStore>, event_tx: broadcast::Sender<OrderEvent>) -> Self {
        Self {
            store,
            event_tx,
            merge_locks: DashMap::new(),
        }
    }

    fn merge_lock(&self, channel: SourceChannel, order_id: &str) -> Arc<Mutex<()>> {
        self.merge_locks
            .entry((channel, order_id.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Merge one remote order
    ///
    /// Idempotent: merging the same payload twice yields exactly one store
    /// record, with the second merge reporting `StaleIgnored`.
    pub async fn merge_remote_order(&self, remote: &RemoteOrder) -> SyncResult<MergeOutcome> {
        if let Err(reason) = remote.validate() {
            return Err(SyncError::Malformed {
                order_id: remote.order_id.clone(),
                reason,
            });
        }

        let lock = self.merge_lock(remote.source_channel, &remote.order_id);
        let _guard = lock.lock().await;

        match self
            .store
            .get(remote.source_channel, &remote.order_id)
            .await?
        {
            None => self.create_from_remote(remote).await,
            Some(existing) => self.reconcile(remote, existing).await,
        }
    }

    async fn create_from_remote(&self, remote: &RemoteOrder) -> SyncResult<MergeOutcome> {
        let status = remote.status.unwrap_or(OrderStatus::New);

        let mut order = Order::new(
            remote.order_id.clone(),
            remote.order_type,
            remote.source_channel,
            remote.items.iter().cloned().map(Into::into).collect(),
        );
        order.status = status;
        order.total_amount = remote.total_amount;
        order.created_at = remote.placed_at;
        order.sequence = remote.sequence;

        let local_id = self.store.create(order).await?;

        tracing::info!(
            order_id = %remote.order_id,
            channel = remote.source_channel.as_str(),
            local_id,
            status = ?status,
            "Remote order created"
        );

        // An initial status past New means the channel already sent it to
        // the kitchen flow; fire the same dispatch a local New -> Kitchen
        // transition would.
        if status.implies_kitchen_dispatch() {
            let event = OrderEvent::new(
                local_id,
                remote.order_id.clone(),
                remote.source_channel,
                OrderStatus::New,
                status,
                remote.sequence,
                TransitionOrigin::Sync,
            );
            let _ = self.event_tx.send(event);
        }

        Ok(MergeOutcome::Created { local_id })
    }

    async fn reconcile(&self, remote: &RemoteOrder, existing: Order) -> SyncResult<MergeOutcome> {
        if remote.sequence <= existing.sequence {
            tracing::debug!(
                order_id = %remote.order_id,
                remote_seq = remote.sequence,
                local_seq = existing.sequence,
                "Stale remote report ignored"
            );
            return Ok(MergeOutcome::StaleIgnored);
        }

        // Only reconcile fields the remote channel owns; the remote status
        // wins by sequence, including over terminal states (audited below).
        let target = remote.status.unwrap_or(existing.status);

        if existing.status.is_terminal() || existing.status == OrderStatus::Completed {
            tracing::warn!(
                order_id = %remote.order_id,
                local_status = ?existing.status,
                remote_status = ?target,
                remote_seq = remote.sequence,
                "Remote report overwrites a terminal local status"
            );
        }

        let applied = self
            .store
            .update_status(existing.local_id, target, remote.sequence)
            .await?;
        if !applied {
            // A concurrent writer advanced the order past this sequence
            // between our read and write
            return Ok(MergeOutcome::StaleIgnored);
        }

        if target != existing.status {
            let event = OrderEvent::new(
                existing.local_id,
                remote.order_id.clone(),
                remote.source_channel,
                existing.status,
                target,
                remote.sequence,
                TransitionOrigin::Sync,
            );
            let _ = self.event_tx.send(event);
        }

        tracing::info!(
            order_id = %remote.order_id,
            local_id = existing.local_id,
            status = ?target,
            sequence = remote.sequence,
            "Remote order reconciled"
        );

        Ok(MergeOutcome::Updated {
            local_id: existing.local_id,
        })
    }

    /// Merge a poll batch
    ///
    /// A malformed order is skipped and reported, never allowed to abort
    /// the rest of the batch; a storage failure marks the batch dirty so
    /// the caller retries the remainder on the next trigger.
    pub async fn merge_batch(&self, batch: &[RemoteOrder]) -> BatchReport {
        let mut report = BatchReport::default();

        for remote in batch {
            match self.merge_remote_order(remote).await {
                Ok(MergeOutcome::Created { .. }) => report.created += 1,
                Ok(MergeOutcome::Updated { .. }) => report.updated += 1,
                Ok(MergeOutcome::StaleIgnored) => report.stale += 1,
                Err(SyncError::Malformed { order_id, reason }) => {
                    tracing::warn!(order_id = %order_id, reason = %reason, "Skipping malformed remote order");
                    report.skipped.push((order_id, reason));
                }
                Err(SyncError::Storage(e)) => {
                    tracing::error!(order_id = %remote.order_id, error = %e, "Failed to merge remote order");
                    report.failed.push((remote.order_id.clone(), e.to_string()));
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("merge_locks", &self.merge_locks.len())
            .finish()
    }
}
