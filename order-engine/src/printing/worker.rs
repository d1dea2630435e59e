//! Kitchen print worker
//!
//! Listens to the lifecycle event stream and runs print dispatch for
//! kitchen-bound transitions. Dispatch is fire-and-forget with respect to
//! the transition caller; outcomes land in the router's tracker and the
//! log.

use super::router::PrintRouter;
use super::types::DispatchResult;
use crate::store::OrderStore;
use shared::order::OrderEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Print dispatch worker
pub struct PrintWorker {
    store: Arc<dyn OrderStore>,
    router: Arc<PrintRouter>,
}

impl PrintWorker {
    pub fn new(store: Arc<dyn OrderStore>, router: Arc<PrintRouter>) -> Self {
        Self { store, router }
    }

    /// Run the worker (blocks until the channel closes or shutdown fires)
    pub async fn run(
        self,
        mut events: broadcast::Receiver<OrderEvent>,
        shutdown: CancellationToken,
    ) {
        tracing::info!("Print worker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Print worker received shutdown signal");
                    break;
                }
                result = events.recv() => {
                    match result {
                        Ok(event) => {
                            if event.is_kitchen_dispatch() {
                                self.handle_dispatch(&event).await;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "Print worker lagged, kitchen tickets may be missing");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Event channel closed, print worker stopping");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Print worker stopped");
    }

    async fn handle_dispatch(&self, event: &OrderEvent) {
        let order = match self.store.get_by_local_id(event.local_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::warn!(local_id = event.local_id, "Order vanished before dispatch");
                return;
            }
            Err(e) => {
                tracing::error!(local_id = event.local_id, error = %e, "Failed to load order for dispatch");
                return;
            }
        };

        let results = self.router.dispatch(&order).await;
        if results.is_empty() {
            return;
        }

        let sent = results.values().filter(|r| r.is_sent()).count();
        let failed = results
            .values()
            .filter(|r| matches!(r, DispatchResult::Failed(_) | DispatchResult::TimedOut))
            .count();
        let skipped = results
            .values()
            .filter(|r| matches!(r, DispatchResult::Skipped(_)))
            .count();

        tracing::info!(
            order_id = %order.order_id,
            groups = results.len(),
            sent,
            failed,
            skipped,
            "Kitchen dispatch complete"
        );
    }
}
