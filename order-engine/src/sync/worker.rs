//! Sync worker - background loop driving the coordinator
//!
//! Two independent triggers feed the merge: a fixed-interval poll
//! fallback and the push stream. Both may fire concurrently; the
//! coordinator's per-key locks make that safe. The poll fetch itself is
//! timeout-bounded so a stalled feed cannot delay the next tick - a stuck
//! fetch is abandoned and retried on the next interval.

use super::coordinator::SyncCoordinator;
use super::cursor::SyncCursor;
use super::feed::RemoteOrderFeed;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

pub struct SyncWorker {
    coordinator: Arc<SyncCoordinator>,
    feed: Arc<dyn RemoteOrderFeed>,
    poll_interval: Duration,
    fetch_timeout: Duration,
    cursor: SyncCursor,
}

impl SyncWorker {
    pub fn new(
        coordinator: Arc<SyncCoordinator>,
        feed: Arc<dyn RemoteOrderFeed>,
        poll_interval: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            coordinator,
            feed,
            poll_interval,
            fetch_timeout,
            cursor: SyncCursor::new(),
        }
    }

    /// Current cursor (for checkpoint inspection)
    pub fn cursor(&self) -> SyncCursor {
        self.cursor
    }

    /// Resume from a previously checkpointed cursor
    pub fn with_cursor(mut self, cursor: SyncCursor) -> Self {
        self.cursor = cursor;
        self
    }

    /// Run the worker (blocks until shutdown)
    ///
    /// 1. Immediate poll on startup to drain anything missed offline
    /// 2. Push arrivals merged as they come
    /// 3. Interval poll as the fallback transport
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "Sync worker started"
        );

        let mut push_rx = self.feed.subscribe();
        let mut push_open = true;

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await; // immediate first tick
        self.poll_once().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Sync worker received shutdown signal");
                    break;
                }

                _ = interval.tick() => {
                    self.poll_once().await;
                }

                result = push_rx.recv(), if push_open => {
                    match result {
                        Ok(remote) => {
                            self.cursor.note_push_sequence(remote.sequence);
                            match self.coordinator.merge_remote_order(&remote).await {
                                Ok(outcome) => {
                                    tracing::debug!(order_id = %remote.order_id, outcome = ?outcome, "Push merge");
                                }
                                Err(e) => {
                                    // Push delivery is best-effort; the poll
                                    // fallback re-fetches anything that failed
                                    tracing::warn!(order_id = %remote.order_id, error = %e, "Push merge failed, poll will retry");
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "Push stream lagged, forcing poll resync");
                            self.poll_once().await;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::warn!("Push stream closed, continuing on poll fallback only");
                            push_open = false;
                        }
                    }
                }
            }
        }

        tracing::info!(cursor = ?self.cursor, "Sync worker stopped");
    }

    /// One poll cycle: fetch, merge, maybe advance the cursor
    pub async fn poll_once(&mut self) {
        let since = self.cursor.last_poll_millis;
        // Watermark taken before the fetch, so an order placed mid-flight
        // is picked up again next time rather than skipped.
        let watermark = shared::util::now_millis();

        let batch = match tokio::time::timeout(self.fetch_timeout, self.feed.poll(since)).await {
            Ok(Ok(batch)) => batch,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Feed poll failed, retrying on next tick");
                return;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.fetch_timeout.as_millis() as u64,
                    "Feed poll stalled, abandoned until next tick"
                );
                return;
            }
        };

        if batch.is_empty() {
            self.cursor.advance_poll(watermark);
            return;
        }

        let total = batch.len();
        let report = self.coordinator.merge_batch(&batch).await;

        tracing::info!(
            total,
            created = report.created,
            updated = report.updated,
            stale = report.stale,
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Poll batch merged"
        );

        if report.clean() {
            self.cursor.advance_poll(watermark);
        } else {
            // Cursor stays behind the failed orders; the next tick
            // re-fetches and the idempotent merge absorbs the replay
            tracing::warn!(
                failed = report.failed.len(),
                "Batch had failures, cursor not advanced"
            );
        }
    }
}
