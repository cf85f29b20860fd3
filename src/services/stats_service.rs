//! Stats service - read-only aggregates and admin membership

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::params;

use crate::db::{admins, LedgerDb};
use crate::error::LedgerError;

/// Aggregate counters for the admin dashboard
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub new_users_today: i64,
    pub total_forecasts: i64,
    pub vip_forecasts: i64,
    /// Sum of all user balances; 0 when there are no users
    pub total_balance: i64,
}

/// Stats service for dashboard aggregates and the admin allow-list
pub struct StatsService {
    db: Arc<LedgerDb>,
}

impl StatsService {
    /// Create a new stats service
    pub fn new(db: Arc<LedgerDb>) -> Self {
        Self { db }
    }

    /// Compute the five dashboard counters at call time, no caching.
    /// `today` uses the same calendar-date semantics as daily-bonus
    /// evaluation and is supplied by the caller.
    pub fn get_stats(&self, today: NaiveDate) -> Result<AdminStats, LedgerError> {
        self.db.with_conn(|conn| {
            let total_users: i64 = conn
                .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

            let new_users_today: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM users WHERE DATE(created_at) = ?",
                    params![today.format("%Y-%m-%d").to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

            let total_forecasts: i64 = conn
                .query_row("SELECT COUNT(*) FROM forecasts", [], |row| row.get(0))
                .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

            let vip_forecasts: i64 = conn
                .query_row("SELECT COUNT(*) FROM forecasts WHERE is_vip = 1", [], |row| row.get(0))
                .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

            let total_balance: i64 = conn
                .query_row("SELECT COALESCE(SUM(balance), 0) FROM users", [], |row| row.get(0))
                .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

            Ok(AdminStats {
                total_users,
                new_users_today,
                total_forecasts,
                vip_forecasts,
                total_balance,
            })
        })
    }

    /// Seed the admin allow-list; idempotent, returns how many were new
    pub fn seed_admins(&self, external_ids: &[i64]) -> Result<usize, LedgerError> {
        self.db.with_conn(|conn| admins::seed_admins(conn, external_ids))
    }

    /// Exact-match membership test
    pub fn is_admin(&self, external_id: i64) -> Result<bool, LedgerError> {
        self.db.with_conn(|conn| admins::is_admin(conn, external_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{forecasts, users};
    use chrono::Utc;

    fn setup() -> (StatsService, Arc<LedgerDb>) {
        let db = Arc::new(LedgerDb::open_in_memory().unwrap());
        (StatsService::new(db.clone()), db)
    }

    fn forecast(vip: bool) -> forecasts::CreateForecastInput {
        forecasts::CreateForecastInput {
            sport: "football".to_string(),
            league: None,
            match_label: "A vs B".to_string(),
            prediction: "X".to_string(),
            coefficient: 3.2,
            confidence: 50,
            comment: None,
            is_vip: vip,
            match_time: None,
        }
    }

    #[test]
    fn empty_store_yields_all_zeros() {
        let (svc, _) = setup();
        let stats = svc.get_stats(Utc::now().date_naive()).unwrap();
        assert_eq!(stats, AdminStats {
            total_users: 0,
            new_users_today: 0,
            total_forecasts: 0,
            vip_forecasts: 0,
            total_balance: 0,
        });
    }

    #[test]
    fn counters_reflect_store_contents() {
        let (svc, db) = setup();

        db.with_conn_mut(|conn| {
            users::upsert_user(conn, 1, "a")?;
            users::upsert_user(conn, 2, "b")?;
            forecasts::create_forecast(conn, &forecast(false))?;
            forecasts::create_forecast(conn, &forecast(false))?;
            forecasts::create_forecast(conn, &forecast(true))?;
            Ok(())
        })
        .unwrap();
        db.with_conn_mut(|conn| users::claim_daily(conn, 1, Utc::now().date_naive()).map(|_| ()))
            .unwrap();

        // created_at defaults to the UTC clock, so "today" is the UTC date
        let stats = svc.get_stats(Utc::now().date_naive()).unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.new_users_today, 2);
        assert_eq!(stats.total_forecasts, 3);
        assert_eq!(stats.vip_forecasts, 1);
        assert_eq!(stats.total_balance, 5);
    }

    #[test]
    fn new_users_counter_excludes_other_dates() {
        let (svc, db) = setup();
        db.with_conn_mut(|conn| users::upsert_user(conn, 1, "a")).unwrap();

        let another_day = NaiveDate::from_ymd_opt(1999, 1, 1).unwrap();
        let stats = svc.get_stats(another_day).unwrap();
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.new_users_today, 0);
    }

    #[test]
    fn admin_membership_round_trips() {
        let (svc, _) = setup();
        assert_eq!(svc.seed_admins(&[10, 20]).unwrap(), 2);
        assert_eq!(svc.seed_admins(&[10, 20]).unwrap(), 0);
        assert!(svc.is_admin(10).unwrap());
        assert!(!svc.is_admin(30).unwrap());
    }
}
