//! Order transition events
//!
//! Every accepted status transition is broadcast as an [`OrderEvent`].
//! Downstream workers (kitchen printing, embedders' UI feeds) subscribe to
//! the stream; the event carries enough context that a consumer never has
//! to re-read the order just to know what changed.

use crate::models::order::SourceChannel;
use crate::order::OrderStatus;
use serde::{Deserialize, Serialize};

/// Where a transition was initiated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionOrigin {
    /// Operator action at the till
    Operator,
    /// Remote feed reconciliation
    Sync,
}

/// Record of one accepted status transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// UUID
    pub event_id: String,
    /// Store-assigned order ID
    pub local_id: i64,
    /// Channel-stable order number
    pub order_id: String,
    pub source_channel: SourceChannel,
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// Order sequence after this transition
    pub sequence: u64,
    /// Event time (millis)
    pub timestamp: i64,
    pub origin: TransitionOrigin,
}

impl OrderEvent {
    pub fn new(
        local_id: i64,
        order_id: impl Into<String>,
        source_channel: SourceChannel,
        from: OrderStatus,
        to: OrderStatus,
        sequence: u64,
        origin: TransitionOrigin,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            local_id,
            order_id: order_id.into(),
            source_channel,
            from,
            to,
            sequence,
            timestamp: crate::util::now_millis(),
            origin,
        }
    }

    /// Whether this transition should trigger kitchen printing
    pub fn is_kitchen_dispatch(&self) -> bool {
        // A transition *into* Kitchen fires dispatch; a sync-created order
        // already past Kitchen fires it too (from == New there).
        self.to == OrderStatus::Kitchen
            || (self.origin == TransitionOrigin::Sync
                && self.from == OrderStatus::New
                && self.to.implies_kitchen_dispatch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kitchen_dispatch_detection() {
        let event = OrderEvent::new(
            1,
            "FAC-1",
            SourceChannel::Local,
            OrderStatus::New,
            OrderStatus::Kitchen,
            1,
            TransitionOrigin::Operator,
        );
        assert!(event.is_kitchen_dispatch());

        // Sync-created order that arrived already Preparing
        let event = OrderEvent::new(
            2,
            "WEB-77",
            SourceChannel::Web,
            OrderStatus::New,
            OrderStatus::Preparing,
            1,
            TransitionOrigin::Sync,
        );
        assert!(event.is_kitchen_dispatch());

        // Plain progress transition does not re-print
        let event = OrderEvent::new(
            3,
            "FAC-2",
            SourceChannel::Local,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            2,
            TransitionOrigin::Operator,
        );
        assert!(!event.is_kitchen_dispatch());
    }
}
