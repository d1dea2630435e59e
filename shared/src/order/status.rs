//! Order status

use serde::{Deserialize, Serialize};

/// Order fulfillment status
///
/// Main line: `New → Kitchen → Preparing → Ready → Delivering → Completed`.
/// Side branches: void from any live state, cancel from `New`, refund from
/// `Completed`. The allowed-successor table is enforced by the engine's
/// state machine; this enum only names the states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 新订单
    #[default]
    New,
    /// 已发送厨房
    Kitchen,
    /// 制作中
    Preparing,
    /// 待取/待派送
    Ready,
    /// 派送中 (Delivery 订单)
    Delivering,
    /// 已完成
    Completed,
    /// 作废
    Void,
    /// 已取消
    Cancelled,
    /// 已退款
    Refunded,
}

impl OrderStatus {
    /// Terminal states accept no further transitions at all.
    ///
    /// `Completed` is not listed: it still accepts `Refunded`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Void | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    /// Whether an order in this status has already been (or should be)
    /// dispatched to the kitchen printers.
    ///
    /// Used when a remote order arrives with an initial status past `New`:
    /// the sync path must fire the same kitchen dispatch a local
    /// `New → Kitchen` transition would.
    pub fn implies_kitchen_dispatch(&self) -> bool {
        matches!(
            self,
            OrderStatus::Kitchen
                | OrderStatus::Preparing
                | OrderStatus::Ready
                | OrderStatus::Delivering
        )
    }
}
