//! redb-backed order store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `local_id` | JSON `Order` | Order records (append + status updates) |
//! | `channel_index` | `"CHANNEL/order_id"` | `local_id` | Channel-stable identity index |
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns (copy-on-write
//! with atomic pointer swap), which matters on till hardware that loses
//! power without warning. Orders are never removed - terminal states stay
//! on disk for audit.

use super::{channel_key, OrderStore, StoreError, StoreResult};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::{Order, OrderFilter, SourceChannel};
use shared::order::OrderStatus;
use std::path::Path;
use std::sync::Arc;

/// Table for order records: key = local_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

/// Table for the channel-stable index: key = "CHANNEL/order_id", value = local_id
const CHANNEL_INDEX_TABLE: TableDefinition<&str, i64> = TableDefinition::new("channel_index");

/// Order store backed by redb
#[derive(Clone)]
pub struct RedbOrderStore {
    db: Arc<Database>,
}

impl RedbOrderStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        // Create tables if they don't exist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(CHANNEL_INDEX_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    fn read_order(&self, local_id: i64) -> StoreResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(local_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl OrderStore for RedbOrderStore {
    async fn create(&self, mut order: Order) -> StoreResult<i64> {
        let key = channel_key(order.source_channel, &order.order_id);

        let txn = self.db.begin_write()?;
        let local_id;
        {
            let mut index = txn.open_table(CHANNEL_INDEX_TABLE)?;
            if index.get(key.as_str())?.is_some() {
                drop(index);
                txn.abort()?;
                return Err(StoreError::DuplicateOrder(key));
            }

            let mut orders = txn.open_table(ORDERS_TABLE)?;
            local_id = loop {
                let id = shared::util::snowflake_id();
                if orders.get(id)?.is_none() {
                    break id;
                }
            };

            order.local_id = local_id;
            let value = serde_json::to_vec(&order)?;
            orders.insert(local_id, value.as_slice())?;
            index.insert(key.as_str(), local_id)?;
        }
        txn.commit()?;

        Ok(local_id)
    }

    async fn get(&self, channel: SourceChannel, order_id: &str) -> StoreResult<Option<Order>> {
        let key = channel_key(channel, order_id);
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(CHANNEL_INDEX_TABLE)?;
        let Some(local_id) = index.get(key.as_str())?.map(|g| g.value()) else {
            return Ok(None);
        };
        drop(index);
        drop(read_txn);
        self.read_order(local_id)
    }

    async fn get_by_local_id(&self, local_id: i64) -> StoreResult<Option<Order>> {
        self.read_order(local_id)
    }

    async fn update_status(
        &self,
        local_id: i64,
        status: OrderStatus,
        sequence: u64,
    ) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let existing = {
            let table = txn.open_table(ORDERS_TABLE)?;
            let guard = table.get(local_id)?;
            match guard {
                Some(guard) => Some(serde_json::from_slice::<Order>(guard.value())?),
                None => None,
            }
        };
        let Some(mut order) = existing else {
            txn.abort()?;
            return Err(StoreError::OrderNotFound(local_id));
        };

        if sequence <= order.sequence {
            txn.abort()?;
            return Ok(false);
        }

        order.status = status;
        order.sequence = sequence;
        order.updated_at = shared::util::now_millis();
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(&order)?;
            table.insert(local_id, value.as_slice())?;
        }
        txn.commit()?;

        Ok(true)
    }

    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if filter.matches(&order) {
                orders.push(order);
            }
        }

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.local_id.cmp(&a.local_id)));
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::{OrderItem, OrderType};

    fn make_order(order_id: &str, channel: SourceChannel) -> Order {
        Order::new(
            order_id,
            OrderType::Collection,
            channel,
            vec![OrderItem {
                item_name: "Flat White".to_string(),
                quantity: 2,
                unit_price: Decimal::new(320, 2),
                print_group_id: Some(3),
                note: None,
            }],
        )
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        let local_id = store
            .create(make_order("WEB-77", SourceChannel::Web))
            .await
            .unwrap();

        let by_key = store
            .get(SourceChannel::Web, "WEB-77")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_key.local_id, local_id);
        assert_eq!(by_key.total_amount, Decimal::new(640, 2));

        let by_id = store.get_by_local_id(local_id).await.unwrap().unwrap();
        assert_eq!(by_id.order_id, "WEB-77");
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        store
            .create(make_order("WEB-77", SourceChannel::Web))
            .await
            .unwrap();
        let err = store
            .create(make_order("WEB-77", SourceChannel::Web))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateOrder(_)));
    }

    #[tokio::test]
    async fn test_update_status_lww_by_sequence() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        let local_id = store
            .create(make_order("CLD-5", SourceChannel::Cloud))
            .await
            .unwrap();

        assert!(
            store
                .update_status(local_id, OrderStatus::Preparing, 3)
                .await
                .unwrap()
        );
        // An older remote report must not win
        assert!(
            !store
                .update_status(local_id, OrderStatus::Kitchen, 2)
                .await
                .unwrap()
        );

        let order = store.get_by_local_id(local_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.sequence, 3);
    }

    #[tokio::test]
    async fn test_update_unknown_order_fails() {
        let store = RedbOrderStore::open_in_memory().unwrap();
        let err = store
            .update_status(42, OrderStatus::Kitchen, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::OrderNotFound(42)));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.redb");

        let local_id = {
            let store = RedbOrderStore::open(&path).unwrap();
            store
                .create(make_order("FAC-9", SourceChannel::Local))
                .await
                .unwrap()
        };

        let store = RedbOrderStore::open(&path).unwrap();
        let order = store.get_by_local_id(local_id).await.unwrap().unwrap();
        assert_eq!(order.order_id, "FAC-9");
    }
}
