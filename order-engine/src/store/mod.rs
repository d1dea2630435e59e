//! Order store - authoritative local persistence
//!
//! The store is the single source of truth for orders. Only the lifecycle
//! state machine and the sync coordinator write order status; everything
//! else reads.
//!
//! Two adapters are provided:
//! - [`MemoryOrderStore`] - DashMap-backed, for tests and embedded use
//! - [`RedbOrderStore`] - durable, redb-backed, for edge devices
//!
//! Both enforce the same contract: `(source_channel, order_id)` is unique,
//! `local_id` is assigned exactly once at first persistence, and status
//! writes carry a sequence number - a write whose sequence is not newer
//! than the stored one is rejected (`Ok(false)`), which is what makes
//! cross-channel merges last-writer-wins by sequence rather than
//! wall-clock.

mod memory;
mod redb_store;

pub use memory::MemoryOrderStore;
pub use redb_store::RedbOrderStore;

use async_trait::async_trait;
use shared::error::AppError;
use shared::models::{Order, OrderFilter, SourceChannel};
use shared::order::OrderStatus;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: local_id={0}")]
    OrderNotFound(i64),

    #[error("Duplicate order: {0}")]
    DuplicateOrder(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        use shared::error::ErrorCode;
        match err {
            StoreError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("local_id={}", id))
            }
            StoreError::DuplicateOrder(key) => {
                AppError::with_message(ErrorCode::DuplicateOrder, key)
            }
            other => AppError::storage(other.to_string()),
        }
    }
}

/// Authoritative order persistence
///
/// Reads and writes may be backed by blocking I/O; callers await them and
/// must not hold them on a UI execution context.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order and assign its `local_id`.
    ///
    /// The incoming order's `local_id` is ignored; the store assigns a
    /// fresh snowflake exactly once. Fails with
    /// [`StoreError::DuplicateOrder`] if `(source_channel, order_id)` is
    /// already present.
    async fn create(&self, order: Order) -> StoreResult<i64>;

    /// Look up by the channel-stable key
    async fn get(&self, channel: SourceChannel, order_id: &str) -> StoreResult<Option<Order>>;

    /// Look up by store-assigned ID
    async fn get_by_local_id(&self, local_id: i64) -> StoreResult<Option<Order>>;

    /// Atomically set status and sequence, stamping `updated_at`.
    ///
    /// Returns `Ok(false)` without touching the order when `sequence` is
    /// not newer than the stored sequence (stale write).
    async fn update_status(
        &self,
        local_id: i64,
        status: OrderStatus,
        sequence: u64,
    ) -> StoreResult<bool>;

    /// List orders matching the filter, newest first
    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;
}

/// Storage key for the channel-stable identity
pub(crate) fn channel_key(channel: SourceChannel, order_id: &str) -> String {
    format!("{}/{}", channel.as_str(), order_id)
}
