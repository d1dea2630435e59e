//! Print routing engine
//!
//! `dispatch` fans an order out to one ticket per non-empty print group
//! and submits them concurrently. Outcomes are independent: there is no
//! shared transaction, and one group's failure never blocks another. The
//! router itself never retries - callers re-invoke `dispatch` for the
//! failed subset, and the per-order-per-group outcome tracker makes that
//! a no-op for groups already confirmed `Sent`.

use super::catalog::PrintGroupCatalog;
use super::pool::PrinterPool;
use super::types::{DispatchResult, SkipReason, Ticket, TicketLine};
use dashmap::DashMap;
use futures::future::join_all;
use shared::models::Order;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Print routing engine
pub struct PrintRouter {
    pool: Arc<dyn PrinterPool>,
    catalog: Arc<PrintGroupCatalog>,
    /// Last outcome per (local_id, group_id)
    outcomes: DashMap<(i64, i64), DispatchResult>,
    submit_timeout: Duration,
}

impl PrintRouter {
    pub fn new(
        pool: Arc<dyn PrinterPool>,
        catalog: Arc<PrintGroupCatalog>,
        submit_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            catalog,
            outcomes: DashMap::new(),
            submit_timeout,
        }
    }

    /// Dispatch an order's items to their group printers
    ///
    /// Returns one [`DispatchResult`] per involved group. Items without a
    /// print group are excluded; an order with zero dispatchable items
    /// returns an empty map and is not an error.
    pub async fn dispatch(&self, order: &Order) -> HashMap<i64, DispatchResult> {
        let grouped = Self::group_items(order);

        if grouped.is_empty() {
            tracing::debug!(order_id = %order.order_id, "No dispatchable items");
            return HashMap::new();
        }

        let mut results: HashMap<i64, DispatchResult> = HashMap::new();
        let mut submissions = Vec::new();

        for (group_id, lines) in grouped {
            // Re-dispatch must not duplicate tickets already on paper
            if let Some(last) = self.outcomes.get(&(order.local_id, group_id))
                && last.is_sent()
            {
                tracing::debug!(
                    order_id = %order.order_id,
                    group_id,
                    "Ticket already sent, skipping resubmission"
                );
                results.insert(group_id, DispatchResult::Sent);
                continue;
            }

            let group = match self.catalog.resolve(group_id) {
                Some(g) => g,
                None => {
                    tracing::warn!(order_id = %order.order_id, group_id, "Unknown print group, skipping");
                    results.insert(group_id, DispatchResult::Skipped(SkipReason::UnknownGroup));
                    continue;
                }
            };
            if !group.is_active {
                tracing::debug!(order_id = %order.order_id, group = %group.name, "Print group inactive, skipping");
                results.insert(group_id, DispatchResult::Skipped(SkipReason::GroupInactive));
                continue;
            }

            let ticket = Ticket {
                order_id: order.order_id.clone(),
                local_id: order.local_id,
                group_id,
                group_name: group.name.clone(),
                order_type: order.order_type,
                lines,
                created_at: shared::util::now_millis(),
            };

            let pool = Arc::clone(&self.pool);
            let timeout = self.submit_timeout;
            let address = group.printer_address.clone();
            submissions.push(async move {
                let outcome = pool.submit(&address, &ticket, timeout).await;
                (group_id, DispatchResult::from(outcome))
            });
        }

        // Fan out: all groups in flight at once, outcomes collected
        // independently.
        for (group_id, result) in join_all(submissions).await {
            match &result {
                DispatchResult::Sent => {
                    tracing::info!(order_id = %order.order_id, group_id, "Ticket dispatched");
                }
                other => {
                    tracing::warn!(order_id = %order.order_id, group_id, result = ?other, "Ticket dispatch failed");
                }
            }
            results.insert(group_id, result);
        }

        for (group_id, result) in &results {
            self.outcomes
                .insert((order.local_id, *group_id), result.clone());
        }

        results
    }

    /// Last recorded outcome for an order/group pair
    pub fn last_outcome(&self, local_id: i64, group_id: i64) -> Option<DispatchResult> {
        self.outcomes.get(&(local_id, group_id)).map(|r| r.clone())
    }

    /// Drop tracked outcomes for an order (terminal cleanup)
    pub fn forget_order(&self, local_id: i64) {
        self.outcomes.retain(|(id, _), _| *id != local_id);
    }

    /// Group dispatchable items into ticket lines, keyed by group id
    fn group_items(order: &Order) -> BTreeMap<i64, Vec<TicketLine>> {
        let mut grouped: BTreeMap<i64, Vec<TicketLine>> = BTreeMap::new();
        for item in &order.items {
            let Some(group_id) = item.print_group_id else {
                continue;
            };
            grouped.entry(group_id).or_default().push(TicketLine {
                item_name: item.item_name.clone(),
                quantity: item.quantity,
                note: item.note.clone(),
            });
        }
        grouped
    }
}

impl std::fmt::Debug for PrintRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintRouter")
            .field("tracked_outcomes", &self.outcomes.len())
            .field("submit_timeout", &self.submit_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printing::pool::MockPrinterPool;
    use crate::printing::types::SubmitOutcome;
    use rust_decimal::Decimal;
    use shared::models::{OrderItem, OrderType, PrintGroup, SourceChannel};

    fn make_group(id: i64, active: bool) -> PrintGroup {
        PrintGroup {
            id,
            name: format!("Station {}", id),
            printer_address: format!("10.0.0.{}:9100", id),
            color_code: None,
            is_active: active,
        }
    }

    fn make_order(items: Vec<(Option<i64>, &str)>) -> Order {
        let mut order = Order::new(
            "FAC-55",
            OrderType::Table,
            SourceChannel::Local,
            items
                .into_iter()
                .map(|(group, name)| OrderItem {
                    item_name: name.to_string(),
                    quantity: 1,
                    unit_price: Decimal::new(500, 2),
                    print_group_id: group,
                    note: None,
                })
                .collect(),
        );
        order.local_id = 7;
        order
    }

    fn make_router(
        groups: Vec<PrintGroup>,
    ) -> (Arc<MockPrinterPool>, PrintRouter) {
        let pool = Arc::new(MockPrinterPool::new());
        let catalog = Arc::new(PrintGroupCatalog::with_groups(groups));
        let router = PrintRouter::new(pool.clone(), catalog, Duration::from_secs(5));
        (pool, router)
    }

    #[tokio::test]
    async fn test_inactive_skipped_active_sent() {
        let (pool, router) = make_router(vec![make_group(1, false), make_group(2, true)]);
        let order = make_order(vec![(Some(1), "Gazpacho"), (Some(2), "Paella")]);

        let results = router.dispatch(&order).await;

        assert_eq!(
            results.get(&1),
            Some(&DispatchResult::Skipped(SkipReason::GroupInactive))
        );
        assert_eq!(results.get(&2), Some(&DispatchResult::Sent));
        assert_eq!(pool.submission_count("10.0.0.2:9100"), 1);
        assert_eq!(pool.submission_count("10.0.0.1:9100"), 0);
    }

    #[tokio::test]
    async fn test_redispatch_does_not_duplicate_sent_ticket() {
        let (pool, router) = make_router(vec![make_group(1, false), make_group(2, true)]);
        let order = make_order(vec![(Some(1), "Gazpacho"), (Some(2), "Paella")]);

        let first = router.dispatch(&order).await;
        let second = router.dispatch(&order).await;

        assert_eq!(first, second);
        // B's printer saw exactly one ticket across both dispatches
        assert_eq!(pool.submission_count("10.0.0.2:9100"), 1);
    }

    #[tokio::test]
    async fn test_failed_group_is_retried_on_redispatch() {
        let (pool, router) = make_router(vec![make_group(1, true), make_group(2, true)]);
        pool.set_outcome("10.0.0.1:9100", SubmitOutcome::TimedOut);
        let order = make_order(vec![(Some(1), "Ramen"), (Some(2), "Gyoza")]);

        let first = router.dispatch(&order).await;
        assert_eq!(first.get(&1), Some(&DispatchResult::TimedOut));
        assert_eq!(first.get(&2), Some(&DispatchResult::Sent));

        // Printer recovers
        pool.set_outcome("10.0.0.1:9100", SubmitOutcome::Sent);
        let second = router.dispatch(&order).await;
        assert_eq!(second.get(&1), Some(&DispatchResult::Sent));
        assert_eq!(second.get(&2), Some(&DispatchResult::Sent));

        // Group 1 submitted twice, group 2 only once
        assert_eq!(pool.submission_count("10.0.0.1:9100"), 2);
        assert_eq!(pool.submission_count("10.0.0.2:9100"), 1);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let (pool, router) =
            make_router(vec![make_group(1, true), make_group(2, true), make_group(3, true)]);
        pool.set_outcome("10.0.0.2:9100", SubmitOutcome::Failed("paper jam".to_string()));
        let order = make_order(vec![(Some(1), "A"), (Some(2), "B"), (Some(3), "C")]);

        let results = router.dispatch(&order).await;

        assert_eq!(results.get(&1), Some(&DispatchResult::Sent));
        assert_eq!(
            results.get(&2),
            Some(&DispatchResult::Failed("paper jam".to_string()))
        );
        assert_eq!(results.get(&3), Some(&DispatchResult::Sent));
    }

    #[tokio::test]
    async fn test_no_dispatchable_items_is_empty_not_error() {
        let (pool, router) = make_router(vec![make_group(1, true)]);
        let order = make_order(vec![(None, "Bottled Water")]);

        let results = router.dispatch(&order).await;

        assert!(results.is_empty());
        assert!(pool.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_group_skipped() {
        let (_pool, router) = make_router(vec![]);
        let order = make_order(vec![(Some(9), "Mystery Dish")]);

        let results = router.dispatch(&order).await;
        assert_eq!(
            results.get(&9),
            Some(&DispatchResult::Skipped(SkipReason::UnknownGroup))
        );
    }

    #[tokio::test]
    async fn test_items_of_one_group_share_a_ticket() {
        let (pool, router) = make_router(vec![make_group(1, true)]);
        let order = make_order(vec![(Some(1), "Soup"), (Some(1), "Salad")]);

        router.dispatch(&order).await;

        // Two items, one group -> exactly one ticket
        assert_eq!(pool.submission_count("10.0.0.1:9100"), 1);
    }
}
