//! Remote order wire payloads
//!
//! Payloads delivered by the remote ordering feed (cloud/web channels),
//! over either the push stream or the periodic poll. The engine merges
//! these into the local store; `(source_channel, order_id)` is the natural
//! dedup key.

use crate::models::order::{OrderItem, OrderType, SourceChannel};
use crate::order::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Line item as reported by the remote channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteOrderItem {
    pub item_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<RemoteOrderItem> for OrderItem {
    fn from(item: RemoteOrderItem) -> Self {
        OrderItem {
            item_name: item.item_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            print_group_id: item.print_group_id,
            note: item.note,
        }
    }
}

/// An order as delivered by the remote feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrder {
    /// Channel-stable order number
    pub order_id: String,
    pub source_channel: SourceChannel,
    pub order_type: OrderType,
    /// Status reported by the channel; None means the feed does not track
    /// status and the order is merged as `New`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    pub items: Vec<RemoteOrderItem>,
    pub total_amount: Decimal,
    /// Remote update sequence, monotonic per order. Used for
    /// last-writer-wins reconciliation instead of wall-clock time.
    pub sequence: u64,
    /// When the channel accepted the order (millis)
    pub placed_at: i64,
}

impl RemoteOrder {
    /// Validate the payload before merging
    ///
    /// A malformed remote order is skipped and reported; it never aborts
    /// the batch it arrived in.
    pub fn validate(&self) -> Result<(), String> {
        if self.order_id.trim().is_empty() {
            return Err("empty order_id".to_string());
        }
        if self.source_channel == SourceChannel::Local {
            return Err("remote order claims LOCAL channel".to_string());
        }
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(format!(
                    "item {:?} has non-positive quantity {}",
                    item.item_name, item.quantity
                ));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(format!("item {:?} has negative price", item.item_name));
            }
        }
        if self.total_amount < Decimal::ZERO {
            return Err("negative total_amount".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_remote_order() -> RemoteOrder {
        RemoteOrder {
            order_id: "WEB-77".to_string(),
            source_channel: SourceChannel::Web,
            order_type: OrderType::Collection,
            status: None,
            items: vec![RemoteOrderItem {
                item_name: "Margherita".to_string(),
                quantity: 1,
                unit_price: Decimal::new(950, 2),
                print_group_id: Some(1),
                note: None,
            }],
            total_amount: Decimal::new(950, 2),
            sequence: 1,
            placed_at: 0,
        }
    }

    #[test]
    fn test_valid_order_passes() {
        assert!(make_remote_order().validate().is_ok());
    }

    #[test]
    fn test_empty_order_id_rejected() {
        let mut order = make_remote_order();
        order.order_id = "  ".to_string();
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_local_channel_rejected() {
        let mut order = make_remote_order();
        order.source_channel = SourceChannel::Local;
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut order = make_remote_order();
        order.items[0].quantity = 0;
        assert!(order.validate().is_err());
    }
}
