//! Remote order feed boundary
//!
//! The feed is owned by the network layer, not this engine. The engine
//! only needs the two transports: an on-demand poll of pending remote
//! orders and a push subscription for real-time arrivals. Any HTTP or
//! WebSocket client can sit behind this trait.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::models::RemoteOrder;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Feed unreachable; retried on the next timer tick, never escalated
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Push + pull access to the remote ordering channel
#[async_trait]
pub trait RemoteOrderFeed: Send + Sync {
    /// Fetch remote orders updated after `since_millis`
    async fn poll(&self, since_millis: i64) -> Result<Vec<RemoteOrder>, FeedError>;

    /// Subscribe to real-time order arrivals
    fn subscribe(&self) -> broadcast::Receiver<RemoteOrder>;
}

/// In-memory feed for tests and offline development
///
/// Orders queued with [`queue`](Self::queue) are returned by `poll`;
/// [`push`](Self::push) delivers through the subscription like a live
/// WebSocket would. `fail_next_poll` scripts one transport failure.
pub struct MemoryRemoteFeed {
    orders: Mutex<Vec<RemoteOrder>>,
    push_tx: broadcast::Sender<RemoteOrder>,
    fail_next_poll: AtomicBool,
    poll_count: Mutex<usize>,
}

impl MemoryRemoteFeed {
    pub fn new() -> Self {
        let (push_tx, _) = broadcast::channel(64);
        Self {
            orders: Mutex::new(Vec::new()),
            push_tx,
            fail_next_poll: AtomicBool::new(false),
            poll_count: Mutex::new(0),
        }
    }

    /// Queue an order for the next poll
    pub fn queue(&self, order: RemoteOrder) {
        self.orders.lock().push(order);
    }

    /// Deliver an order through the push stream
    pub fn push(&self, order: RemoteOrder) {
        let _ = self.push_tx.send(order);
    }

    /// Make the next poll fail with a transport error
    pub fn fail_next_poll(&self) {
        self.fail_next_poll.store(true, Ordering::SeqCst);
    }

    /// Number of polls served so far
    pub fn poll_count(&self) -> usize {
        *self.poll_count.lock()
    }
}

impl Default for MemoryRemoteFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteOrderFeed for MemoryRemoteFeed {
    async fn poll(&self, since_millis: i64) -> Result<Vec<RemoteOrder>, FeedError> {
        *self.poll_count.lock() += 1;
        if self.fail_next_poll.swap(false, Ordering::SeqCst) {
            return Err(FeedError::Transport("connection refused".to_string()));
        }
        Ok(self
            .orders
            .lock()
            .iter()
            .filter(|o| o.placed_at > since_millis)
            .cloned()
            .collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<RemoteOrder> {
        self.push_tx.subscribe()
    }
}
