//! Engine assembly
//!
//! Wires the store, state machine, coordinator, router, and ledger into an
//! [`EngineState`], and spawns the two background tasks: the sync worker
//! (poll + push merge loop) and the print worker (kitchen dispatch
//! listener).

use crate::core::{BackgroundTasks, Config, EngineState, TaskKind};
use crate::ledger::BalanceLedger;
use crate::lifecycle::StateMachine;
use crate::printing::{PrintGroupCatalog, PrintRouter, PrintWorker, PrinterPool};
use crate::store::OrderStore;
use crate::sync::{RemoteOrderFeed, SyncCoordinator, SyncWorker};
use shared::models::PrintGroup;
use std::sync::Arc;

pub struct Engine;

impl Engine {
    /// Assemble the engine and start its background tasks
    ///
    /// The store, feed, and printer pool are collaborator boundaries owned
    /// by the embedder; the engine owns everything in between.
    pub fn start(
        config: Config,
        store: Arc<dyn OrderStore>,
        feed: Arc<dyn RemoteOrderFeed>,
        pool: Arc<dyn PrinterPool>,
        print_groups: Vec<PrintGroup>,
    ) -> (EngineState, BackgroundTasks) {
        let state_machine = Arc::new(StateMachine::new(
            Arc::clone(&store),
            config.event_channel_capacity,
        ));
        let coordinator = Arc::new(SyncCoordinator::new(
            Arc::clone(&store),
            state_machine.event_sender(),
        ));
        let catalog = Arc::new(PrintGroupCatalog::with_groups(print_groups));
        let router = Arc::new(PrintRouter::new(
            pool,
            Arc::clone(&catalog),
            config.print_submit_timeout(),
        ));
        let ledger = Arc::new(BalanceLedger::new());

        let state = EngineState {
            config: config.clone(),
            store: Arc::clone(&store),
            state_machine: Arc::clone(&state_machine),
            coordinator: Arc::clone(&coordinator),
            router: Arc::clone(&router),
            catalog,
            ledger,
        };

        let mut tasks = BackgroundTasks::new();

        let sync_worker = SyncWorker::new(
            Arc::clone(&coordinator),
            feed,
            config.sync_poll_interval(),
            config.sync_fetch_timeout(),
        );
        let shutdown = tasks.shutdown_token();
        tasks.spawn("sync_worker", TaskKind::Worker, async move {
            sync_worker.run(shutdown).await;
        });

        let print_worker = PrintWorker::new(Arc::clone(&store), router);
        let events = state_machine.subscribe();
        let shutdown = tasks.shutdown_token();
        tasks.spawn("print_worker", TaskKind::Listener, async move {
            print_worker.run(events, shutdown).await;
        });

        tracing::info!(tasks = tasks.len(), "Order engine started");

        (state, tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printing::MockPrinterPool;
    use crate::store::MemoryOrderStore;
    use crate::sync::MemoryRemoteFeed;
    use rust_decimal::Decimal;
    use shared::models::{Order, OrderItem, OrderType, SourceChannel};
    use shared::order::OrderStatus;
    use std::time::Duration;

    fn make_group(id: i64) -> PrintGroup {
        PrintGroup {
            id,
            name: format!("Station {}", id),
            printer_address: format!("10.0.0.{}:9100", id),
            color_code: Some("#E53935".to_string()),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_transition_to_kitchen_reaches_printer() {
        let store: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new());
        let feed = Arc::new(MemoryRemoteFeed::new());
        let pool = Arc::new(MockPrinterPool::new());

        let config = Config::with_overrides("/tmp/engine-test", 3600, 1000);
        let (state, tasks) = Engine::start(
            config,
            Arc::clone(&store),
            feed,
            pool.clone(),
            vec![make_group(1)],
        );

        let order = Order::new(
            "FAC-1",
            OrderType::Table,
            SourceChannel::Local,
            vec![OrderItem {
                item_name: "Tortilla".to_string(),
                quantity: 1,
                unit_price: Decimal::new(650, 2),
                print_group_id: Some(1),
                note: None,
            }],
        );
        let local_id = store.create(order).await.unwrap();

        state
            .state_machine
            .transition(local_id, OrderStatus::Kitchen)
            .await
            .unwrap();

        // The print worker picks the event up asynchronously
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(pool.submission_count("10.0.0.1:9100"), 1);

        tasks.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_pushed_remote_order_lands_in_store() {
        let store: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new());
        let feed = Arc::new(MemoryRemoteFeed::new());
        let pool = Arc::new(MockPrinterPool::new());

        let config = Config::with_overrides("/tmp/engine-test", 3600, 1000);
        let (_state, tasks) = Engine::start(config, Arc::clone(&store), feed.clone(), pool, vec![]);

        // Let the sync worker subscribe before pushing
        tokio::time::sleep(Duration::from_millis(50)).await;

        feed.push(shared::models::RemoteOrder {
            order_id: "WEB-12".to_string(),
            source_channel: SourceChannel::Web,
            order_type: OrderType::Collection,
            status: None,
            items: vec![],
            total_amount: Decimal::ZERO,
            sequence: 1,
            placed_at: shared::util::now_millis(),
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(
            store
                .get(SourceChannel::Web, "WEB-12")
                .await
                .unwrap()
                .is_some()
        );

        tasks.shutdown(Duration::from_secs(1)).await;
    }
}
