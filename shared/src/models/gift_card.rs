//! Gift Card Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Gift card entity (礼品卡)
///
/// The stored balance is backed by the append-only movement log: at any
/// point, balance = activation + top-ups - successful redemptions, and it
/// never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCard {
    pub card_number: String,
    pub balance: Decimal,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<chrono::NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl GiftCard {
    /// Create an active card with an opening balance
    pub fn new(card_number: impl Into<String>, opening_balance: Decimal) -> Self {
        let now = crate::util::now_millis();
        Self {
            card_number: card_number.into(),
            balance: opening_balance,
            is_active: true,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set an expiry date
    pub fn with_expiry(mut self, expiry: chrono::NaiveDate) -> Self {
        self.expiry_date = Some(expiry);
        self
    }

    /// Whether the card is past its expiry date
    pub fn is_expired(&self, today: chrono::NaiveDate) -> bool {
        self.expiry_date.is_some_and(|d| today > d)
    }
}

/// Kind of balance movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Opening balance when the card was registered
    Activation,
    /// Balance debit against an order
    Redemption,
    /// Balance credit
    TopUp,
}

/// One entry in a card's append-only movement log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerMovement {
    /// UUID
    pub movement_id: String,
    pub card_number: String,
    pub kind: MovementKind,
    /// Movement amount, always positive; kind determines direction
    pub amount: Decimal,
    /// Balance after this movement was applied
    pub balance_after: Decimal,
    pub timestamp: i64,
    /// Order the redemption was applied to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let card = GiftCard::new("GC-1001", Decimal::new(5000, 2))
            .with_expiry(chrono::NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());

        let before = chrono::NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let after = chrono::NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(!card.is_expired(before));
        assert!(card.is_expired(after));
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let card = GiftCard::new("GC-1002", Decimal::ONE_HUNDRED);
        let today = chrono::NaiveDate::from_ymd_opt(2099, 12, 31).unwrap();
        assert!(!card.is_expired(today));
    }
}
