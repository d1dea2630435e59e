//! Remote order synchronization
//!
//! Keeps the local store consistent with the remote ordering feed without
//! duplicating or losing orders, under two independent triggers: a
//! fixed-interval poll fallback and the real-time push stream. Merges for
//! one `(channel, order_id)` key are serialized; distinct keys proceed in
//! parallel; the whole pipeline is at-least-once with idempotent merge.

mod coordinator;
mod cursor;
mod feed;
mod worker;

pub use coordinator::{BatchReport, MergeOutcome, SyncCoordinator, SyncError};
pub use cursor::SyncCursor;
pub use feed::{FeedError, MemoryRemoteFeed, RemoteOrderFeed};
pub use worker::SyncWorker;
