//! Account service - user records, balances, and daily-bonus claims

use std::sync::Arc;

use chrono::NaiveDate;

use crate::db::{users, LedgerDb};
use crate::error::LedgerError;

use super::events::{EventBus, LedgerEvent};

pub use crate::db::users::{BonusOutcome, DailyBonus, UserRow};

/// Account service for user lifecycle and the points ledger
pub struct AccountService {
    db: Arc<LedgerDb>,
    events: Arc<EventBus>,
}

impl AccountService {
    /// Create a new account service
    pub fn new(db: Arc<LedgerDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Create the user on first contact, or refresh the display name.
    /// Idempotent; intended to run on every inbound message.
    pub fn upsert_user(&self, external_id: i64, display_name: &str) -> Result<(), LedgerError> {
        self.db.with_conn_mut(|conn| users::upsert_user(conn, external_id, display_name))?;

        self.events.emit(LedgerEvent::UserUpserted { external_id });

        Ok(())
    }

    /// Get a user record by external id
    pub fn get_user(&self, external_id: i64) -> Result<Option<UserRow>, LedgerError> {
        self.db.with_conn(|conn| users::get_user(conn, external_id))
    }

    /// Current balance; 0 for unknown users
    pub fn get_balance(&self, external_id: i64) -> Result<i64, LedgerError> {
        self.db.with_conn(|conn| users::get_balance(conn, external_id))
    }

    /// Claim the daily bonus for the caller-supplied calendar date.
    /// A repeat claim on the same date is a zero-credit outcome, not an error.
    pub fn claim_daily_bonus(&self, external_id: i64, today: NaiveDate) -> Result<DailyBonus, LedgerError> {
        let bonus = self.db.with_conn_mut(|conn| users::claim_daily(conn, external_id, today))?;

        if bonus.credited > 0 {
            self.events.emit(LedgerEvent::DailyBonusClaimed {
                external_id,
                credited: bonus.credited,
                streak: bonus.streak,
            });
        }

        Ok(bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AccountService {
        AccountService::new(
            Arc::new(LedgerDb::open_in_memory().unwrap()),
            Arc::new(EventBus::new()),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn upsert_then_balance_starts_at_zero() {
        let svc = service();
        svc.upsert_user(42, "bob").unwrap();
        assert_eq!(svc.get_balance(42).unwrap(), 0);
    }

    #[test]
    fn claim_emits_event_only_when_credited() {
        let db = Arc::new(LedgerDb::open_in_memory().unwrap());
        let events = Arc::new(EventBus::new());
        let svc = AccountService::new(db, events.clone());
        let mut receiver = events.subscribe();

        let today = date(2024, 3, 1);
        svc.claim_daily_bonus(1, today).unwrap();
        svc.claim_daily_bonus(1, today).unwrap();

        assert!(matches!(
            receiver.try_recv().unwrap(),
            LedgerEvent::DailyBonusClaimed { credited: 5, .. }
        ));
        // Second same-day claim credited nothing and emitted nothing
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn claim_outcome_flows_through_the_service() {
        let svc = service();
        svc.upsert_user(1, "bob").unwrap();

        let first = svc.claim_daily_bonus(1, date(2024, 3, 1)).unwrap();
        assert_eq!(first.outcome, BonusOutcome::FirstClaim);

        let next = svc.claim_daily_bonus(1, date(2024, 3, 2)).unwrap();
        assert_eq!(next.outcome, BonusOutcome::StreakContinued);
        assert_eq!(svc.get_balance(1).unwrap(), 10);
    }
}
