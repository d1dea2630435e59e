//! In-memory order store
//!
//! DashMap-backed twin of the durable adapter. Used by tests and by
//! embedders that keep their own persistence.

use super::{channel_key, OrderStore, StoreError, StoreResult};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared::models::{Order, OrderFilter, SourceChannel};
use shared::order::OrderStatus;

/// In-memory order store
///
/// `index` maps the channel-stable key to the assigned `local_id`; the
/// index entry is the linearization point for duplicate detection, so two
/// concurrent creates for the same `(channel, order_id)` cannot both
/// succeed.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: DashMap<i64, Order>,
    index: DashMap<String, i64>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_local_id(&self) -> i64 {
        loop {
            let id = shared::util::snowflake_id();
            if !self.orders.contains_key(&id) {
                return id;
            }
        }
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, mut order: Order) -> StoreResult<i64> {
        let key = channel_key(order.source_channel, &order.order_id);
        let local_id = self.assign_local_id();

        match self.index.entry(key.clone()) {
            Entry::Occupied(_) => return Err(StoreError::DuplicateOrder(key)),
            Entry::Vacant(entry) => {
                entry.insert(local_id);
            }
        }

        order.local_id = local_id;
        self.orders.insert(local_id, order);
        Ok(local_id)
    }

    async fn get(&self, channel: SourceChannel, order_id: &str) -> StoreResult<Option<Order>> {
        let key = channel_key(channel, order_id);
        let Some(local_id) = self.index.get(&key).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.orders.get(&local_id).map(|o| o.clone()))
    }

    async fn get_by_local_id(&self, local_id: i64) -> StoreResult<Option<Order>> {
        Ok(self.orders.get(&local_id).map(|o| o.clone()))
    }

    async fn update_status(
        &self,
        local_id: i64,
        status: OrderStatus,
        sequence: u64,
    ) -> StoreResult<bool> {
        let Some(mut order) = self.orders.get_mut(&local_id) else {
            return Err(StoreError::OrderNotFound(local_id));
        };
        if sequence <= order.sequence {
            return Ok(false);
        }
        order.status = status;
        order.sequence = sequence;
        order.updated_at = shared::util::now_millis();
        Ok(true)
    }

    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
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
            OrderType::Table,
            channel,
            vec![OrderItem {
                item_name: "Espresso".to_string(),
                quantity: 1,
                unit_price: Decimal::new(180, 2),
                print_group_id: None,
                note: None,
            }],
        )
    }

    #[tokio::test]
    async fn test_create_assigns_local_id_once() {
        let store = MemoryOrderStore::new();
        let local_id = store
            .create(make_order("FAC-1", SourceChannel::Local))
            .await
            .unwrap();
        assert!(local_id > 0);

        let stored = store.get_by_local_id(local_id).await.unwrap().unwrap();
        assert_eq!(stored.order_id, "FAC-1");
        assert_eq!(stored.local_id, local_id);
    }

    #[tokio::test]
    async fn test_duplicate_channel_key_rejected() {
        let store = MemoryOrderStore::new();
        store
            .create(make_order("WEB-77", SourceChannel::Web))
            .await
            .unwrap();

        let err = store
            .create(make_order("WEB-77", SourceChannel::Web))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateOrder(_)));

        // Same number on a different channel is a different order
        assert!(
            store
                .create(make_order("WEB-77", SourceChannel::Cloud))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_stale_sequence_rejected() {
        let store = MemoryOrderStore::new();
        let local_id = store
            .create(make_order("FAC-2", SourceChannel::Local))
            .await
            .unwrap();

        assert!(
            store
                .update_status(local_id, OrderStatus::Kitchen, 1)
                .await
                .unwrap()
        );
        assert!(
            store
                .update_status(local_id, OrderStatus::Preparing, 2)
                .await
                .unwrap()
        );

        // Sequence 1 is stale now - rejected, order unchanged
        assert!(
            !store
                .update_status(local_id, OrderStatus::Kitchen, 1)
                .await
                .unwrap()
        );
        let order = store.get_by_local_id(local_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.sequence, 2);
    }

    #[tokio::test]
    async fn test_list_filters_by_channel() {
        let store = MemoryOrderStore::new();
        store
            .create(make_order("FAC-1", SourceChannel::Local))
            .await
            .unwrap();
        store
            .create(make_order("WEB-1", SourceChannel::Web))
            .await
            .unwrap();

        let filter = OrderFilter {
            source_channel: Some(SourceChannel::Web),
            ..Default::default()
        };
        let orders = store.list(&filter).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "WEB-1");
    }
}
