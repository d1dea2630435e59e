//! Order Model

use crate::order::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fulfillment type of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// 自取
    Collection,
    /// 外送
    Delivery,
    /// 堂食
    #[default]
    Table,
}

/// Channel an order originated from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceChannel {
    /// Created at the till
    #[default]
    Local,
    /// Cloud ordering channel
    Cloud,
    /// Web ordering channel
    Web,
}

impl SourceChannel {
    /// Stable string form, used as a storage key prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceChannel::Local => "LOCAL",
            SourceChannel::Cloud => "CLOUD",
            SourceChannel::Web => "WEB",
        }
    }
}

/// A line item on an order
///
/// Owned exclusively by its order; `print_group_id = None` means the item
/// never appears on a kitchen ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub item_name: String,
    /// Quantity, always > 0
    pub quantity: i32,
    /// Unit price, never negative
    pub unit_price: Decimal,
    /// Print group this item routes to (weak reference, by id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_group_id: Option<i64>,
    /// Item note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Order entity
///
/// `order_id` is the channel-stable, human-readable number; `local_id` is
/// the store-assigned snowflake, globally unique and assigned exactly once
/// at first persistence (0 = not yet persisted). Orders are never deleted:
/// terminal states are retained for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Channel-stable order number (unique per source channel)
    pub order_id: String,
    /// Store-assigned ID, 0 until first persistence
    #[serde(default)]
    pub local_id: i64,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub source_channel: SourceChannel,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
    /// Per-order update counter for cross-channel last-writer-wins.
    /// Monotonic, never wall-clock.
    #[serde(default)]
    pub sequence: u64,
}

impl Order {
    /// Create a new unpersisted order with status `New`
    pub fn new(
        order_id: impl Into<String>,
        order_type: OrderType,
        source_channel: SourceChannel,
        items: Vec<OrderItem>,
    ) -> Self {
        let now = crate::util::now_millis();
        let total_amount = items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();
        Self {
            order_id: order_id.into(),
            local_id: 0,
            order_type,
            status: OrderStatus::New,
            source_channel,
            items,
            total_amount,
            created_at: now,
            updated_at: now,
            sequence: 0,
        }
    }

    /// Items that route to a kitchen ticket
    pub fn dispatchable_items(&self) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(|i| i.print_group_id.is_some())
    }
}

/// Filter for listing orders
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_channel: Option<SourceChannel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
}

impl OrderFilter {
    /// Check an order against this filter
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        if let Some(channel) = self.source_channel
            && order.source_channel != channel
        {
            return false;
        }
        if let Some(order_type) = self.order_type
            && order.order_type != order_type
        {
            return false;
        }
        true
    }
}
