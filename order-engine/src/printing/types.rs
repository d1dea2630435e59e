//! Print routing types

use serde::{Deserialize, Serialize};
use shared::models::OrderType;

/// One line on a kitchen ticket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketLine {
    pub item_name: String,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One dispatch unit: the items of one print group for one order
///
/// The ticket is a structured payload; how a concrete printer renders it
/// is the printer adapter's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub order_id: String,
    pub local_id: i64,
    pub group_id: i64,
    pub group_name: String,
    pub order_type: OrderType,
    pub lines: Vec<TicketLine>,
    pub created_at: i64,
}

/// Outcome of a single printer submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    Failed(String),
    TimedOut,
}

/// Why a group was skipped without a submission attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    /// No configuration for this print group id
    UnknownGroup,
    /// Group exists but is disabled
    GroupInactive,
}

/// Per-group dispatch outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DispatchResult {
    Sent,
    Skipped(SkipReason),
    Failed(String),
    TimedOut,
}

impl DispatchResult {
    /// Whether the ticket is confirmed on paper (re-dispatch is a no-op)
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchResult::Sent)
    }
}

impl From<SubmitOutcome> for DispatchResult {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Sent => DispatchResult::Sent,
            SubmitOutcome::Failed(reason) => DispatchResult::Failed(reason),
            SubmitOutcome::TimedOut => DispatchResult::TimedOut,
        }
    }
}
