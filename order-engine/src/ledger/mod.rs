//! Gift card balance ledger
//!
//! Serializes balance-affecting operations per card so "check balance,
//! then redeem" is one atomic unit: there is no window where two
//! concurrent redemptions can both pass the check against a balance
//! neither has yet debited. Distinct cards are mutated in parallel.
//!
//! Every successful mutation appends a [`LedgerMovement`]; the movement
//! log is append-only and backs the current balance, so at any point
//! balance = activation + top-ups - successful redemptions.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use shared::error::AppError;
use shared::models::{GiftCard, LedgerMovement, MovementKind};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Gift card not found: {0}")]
    NotFound(String),

    #[error("Gift card already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Gift card inactive: {0}")]
    Inactive(String),

    #[error("Gift card expired: {0}")]
    Expired(String),

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        use shared::error::ErrorCode;
        match &err {
            LedgerError::NotFound(card) => {
                AppError::with_message(ErrorCode::CardNotFound, err.to_string())
                    .with_detail("card_number", card.clone())
            }
            LedgerError::AlreadyRegistered(card) => {
                AppError::already_exists(format!("Gift card {}", card))
            }
            LedgerError::Inactive(_) => AppError::with_message(ErrorCode::CardInactive, err.to_string()),
            LedgerError::Expired(_) => AppError::with_message(ErrorCode::CardExpired, err.to_string()),
            LedgerError::InsufficientBalance { .. } => {
                AppError::with_message(ErrorCode::InsufficientBalance, err.to_string())
            }
            LedgerError::InvalidAmount(_) => {
                AppError::with_message(ErrorCode::InvalidAmount, err.to_string())
            }
        }
    }
}

/// Per-card state guarded by the card's own lock
#[derive(Debug)]
struct CardState {
    card: GiftCard,
    movements: Vec<LedgerMovement>,
}

/// Balance ledger for stored-value cards
///
/// The DashMap entry holds an `Arc<Mutex<CardState>>` per card; the Arc is
/// cloned out before locking so no DashMap shard lock is held across an
/// await point.
#[derive(Debug, Default)]
pub struct BalanceLedger {
    cards: DashMap<String, Arc<Mutex<CardState>>>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn card_state(&self, card_number: &str) -> LedgerResult<Arc<Mutex<CardState>>> {
        self.cards
            .get(card_number)
            .map(|entry| entry.clone())
            .ok_or_else(|| LedgerError::NotFound(card_number.to_string()))
    }

    fn today() -> chrono::NaiveDate {
        chrono::Utc::now().date_naive()
    }

    /// Register a card with the ledger
    ///
    /// The opening balance is recorded as an `Activation` movement.
    pub fn register(&self, card: GiftCard) -> LedgerResult<()> {
        let card_number = card.card_number.clone();
        let movement = LedgerMovement {
            movement_id: uuid::Uuid::new_v4().to_string(),
            card_number: card_number.clone(),
            kind: MovementKind::Activation,
            amount: card.balance,
            balance_after: card.balance,
            timestamp: shared::util::now_millis(),
            order_id: None,
        };

        match self.cards.entry(card_number.clone()) {
            Entry::Occupied(_) => Err(LedgerError::AlreadyRegistered(card_number)),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(CardState {
                    card,
                    movements: vec![movement],
                })));
                tracing::info!(card_number = %card_number, "Gift card registered");
                Ok(())
            }
        }
    }

    /// Redeem an amount against a card
    ///
    /// Check and debit happen as one atomic unit under the card lock. On
    /// success the new balance is returned and a `Redemption` movement
    /// appended.
    pub async fn redeem(
        &self,
        card_number: &str,
        amount: Decimal,
        order_id: Option<&str>,
    ) -> LedgerResult<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let state = self.card_state(card_number)?;
        let mut state = state.lock().await;

        if !state.card.is_active {
            return Err(LedgerError::Inactive(card_number.to_string()));
        }
        if state.card.is_expired(Self::today()) {
            return Err(LedgerError::Expired(card_number.to_string()));
        }
        if amount > state.card.balance {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: state.card.balance,
            });
        }

        state.card.balance -= amount;
        state.card.updated_at = shared::util::now_millis();
        let balance_after = state.card.balance;

        state.movements.push(LedgerMovement {
            movement_id: uuid::Uuid::new_v4().to_string(),
            card_number: card_number.to_string(),
            kind: MovementKind::Redemption,
            amount,
            balance_after,
            timestamp: shared::util::now_millis(),
            order_id: order_id.map(|s| s.to_string()),
        });

        tracing::info!(
            card_number = %card_number,
            amount = %amount,
            balance = %balance_after,
            "Gift card redeemed"
        );

        Ok(balance_after)
    }

    /// Credit a card
    pub async fn top_up(&self, card_number: &str, amount: Decimal) -> LedgerResult<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let state = self.card_state(card_number)?;
        let mut state = state.lock().await;

        if !state.card.is_active {
            return Err(LedgerError::Inactive(card_number.to_string()));
        }
        if state.card.is_expired(Self::today()) {
            return Err(LedgerError::Expired(card_number.to_string()));
        }

        state.card.balance += amount;
        state.card.updated_at = shared::util::now_millis();
        let balance_after = state.card.balance;

        state.movements.push(LedgerMovement {
            movement_id: uuid::Uuid::new_v4().to_string(),
            card_number: card_number.to_string(),
            kind: MovementKind::TopUp,
            amount,
            balance_after,
            timestamp: shared::util::now_millis(),
            order_id: None,
        });

        Ok(balance_after)
    }

    /// Disable a card; history is retained
    pub async fn deactivate(&self, card_number: &str) -> LedgerResult<()> {
        let state = self.card_state(card_number)?;
        let mut state = state.lock().await;
        state.card.is_active = false;
        state.card.updated_at = shared::util::now_millis();
        tracing::info!(card_number = %card_number, "Gift card deactivated");
        Ok(())
    }

    /// Current balance
    pub async fn balance(&self, card_number: &str) -> LedgerResult<Decimal> {
        let state = self.card_state(card_number)?;
        let state = state.lock().await;
        Ok(state.card.balance)
    }

    /// Snapshot of the card entity
    pub async fn card(&self, card_number: &str) -> LedgerResult<GiftCard> {
        let state = self.card_state(card_number)?;
        let state = state.lock().await;
        Ok(state.card.clone())
    }

    /// Append-only movement history, oldest first
    pub async fn movements(&self, card_number: &str) -> LedgerResult<Vec<LedgerMovement>> {
        let state = self.card_state(card_number)?;
        let state = state.lock().await;
        Ok(state.movements.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_card(ledger: &BalanceLedger, card_number: &str, cents: i64) {
        ledger
            .register(GiftCard::new(card_number, Decimal::new(cents, 2)))
            .unwrap();
    }

    #[tokio::test]
    async fn test_redeem_debits_and_records_movement() {
        let ledger = BalanceLedger::new();
        register_card(&ledger, "GC-1001", 5000);

        let balance = ledger
            .redeem("GC-1001", Decimal::new(1250, 2), Some("FAC-1"))
            .await
            .unwrap();
        assert_eq!(balance, Decimal::new(3750, 2));

        let movements = ledger.movements("GC-1001").await.unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].kind, MovementKind::Activation);
        assert_eq!(movements[1].kind, MovementKind::Redemption);
        assert_eq!(movements[1].balance_after, Decimal::new(3750, 2));
        assert_eq!(movements[1].order_id.as_deref(), Some("FAC-1"));
    }

    #[tokio::test]
    async fn test_error_taxonomy() {
        let ledger = BalanceLedger::new();
        register_card(&ledger, "GC-1001", 1000);

        assert!(matches!(
            ledger.redeem("GC-9999", Decimal::ONE, None).await,
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.redeem("GC-1001", Decimal::ZERO, None).await,
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.redeem("GC-1001", Decimal::new(-100, 2), None).await,
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.redeem("GC-1001", Decimal::new(1001, 2), None).await,
            Err(LedgerError::InsufficientBalance { .. })
        ));

        ledger.deactivate("GC-1001").await.unwrap();
        assert!(matches!(
            ledger.redeem("GC-1001", Decimal::ONE, None).await,
            Err(LedgerError::Inactive(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_card_rejected() {
        let ledger = BalanceLedger::new();
        let expired = GiftCard::new("GC-OLD", Decimal::ONE_HUNDRED)
            .with_expiry(chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        ledger.register(expired).unwrap();

        assert!(matches!(
            ledger.redeem("GC-OLD", Decimal::ONE, None).await,
            Err(LedgerError::Expired(_))
        ));
        assert!(matches!(
            ledger.top_up("GC-OLD", Decimal::ONE).await,
            Err(LedgerError::Expired(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let ledger = BalanceLedger::new();
        register_card(&ledger, "GC-1001", 1000);
        let err = ledger
            .register(GiftCard::new("GC-1001", Decimal::TEN))
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyRegistered(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redeems_cannot_overdraw() {
        // GC-1001 holds 50.00; two concurrent 30.00 redemptions race.
        // Exactly one may win.
        let ledger = Arc::new(BalanceLedger::new());
        register_card(&ledger, "GC-1001", 5000);

        let amount = Decimal::new(3000, 2);
        let a = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.redeem("GC-1001", amount, None).await })
        };
        let b = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.redeem("GC-1001", amount, None).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let insufficient = results
            .iter()
            .filter(|r| matches!(r, Err(LedgerError::InsufficientBalance { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(insufficient, 1);
        assert_eq!(
            ledger.balance("GC-1001").await.unwrap(),
            Decimal::new(2000, 2)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_final_balance_equals_opening_minus_successes() {
        let ledger = Arc::new(BalanceLedger::new());
        register_card(&ledger, "GC-2000", 10_000); // 100.00

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger.redeem("GC-2000", Decimal::new(900, 2), None).await
            }));
        }

        let mut succeeded = Decimal::ZERO;
        for handle in handles {
            if let Ok(_) = handle.await.unwrap() {
                succeeded += Decimal::new(900, 2);
            }
        }

        let balance = ledger.balance("GC-2000").await.unwrap();
        assert_eq!(balance, Decimal::new(10_000, 2) - succeeded);
        assert!(balance >= Decimal::ZERO);

        // Movement log accounts for every successful debit
        let movements = ledger.movements("GC-2000").await.unwrap();
        let redeemed: Decimal = movements
            .iter()
            .filter(|m| m.kind == MovementKind::Redemption)
            .map(|m| m.amount)
            .sum();
        assert_eq!(redeemed, succeeded);
    }

    #[tokio::test]
    async fn test_top_up_extends_redeemable_total() {
        let ledger = BalanceLedger::new();
        register_card(&ledger, "GC-3000", 1000);

        ledger
            .top_up("GC-3000", Decimal::new(500, 2))
            .await
            .unwrap();
        let balance = ledger
            .redeem("GC-3000", Decimal::new(1500, 2), None)
            .await
            .unwrap();
        assert_eq!(balance, Decimal::ZERO);
    }
}
