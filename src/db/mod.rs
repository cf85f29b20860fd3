//! SQLite database module for the points ledger and forecast catalog
//!
//! All durable state lives here, in four tables:
//!
//! - `users` - accounts keyed by external id, balance, daily streak state
//! - `forecasts` - curated prediction items
//! - `views` - one row per (user, forecast) pair, the reward dedup record
//! - `admins` - administrator allow-list
//!
//! The connection is shared behind a mutex; every read-modify-write sequence
//! (daily claim, view + credit) runs as one transaction under that lock, so
//! same-user balance mutations are linearizable and lost updates cannot occur.

pub mod admins;
pub mod forecasts;
pub mod schema;
pub mod users;
pub mod views;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::LedgerError;

/// SQLite database for the ledger
pub struct LedgerDb {
    conn: Mutex<Connection>,
}

impl LedgerDb {
    /// Open or create the ledger database
    pub fn open(data_dir: &Path) -> Result<Self, LedgerError> {
        let db_path = data_dir.join("ledger.db");
        info!("Opening SQLite database at {:?}", db_path);

        let conn = Connection::open(&db_path)
            .map_err(|e| LedgerError::Internal(format!("Failed to open SQLite: {}", e)))?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| LedgerError::Internal(format!("Failed to set PRAGMA: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        debug!("Opening in-memory SQLite database");

        let conn = Connection::open_in_memory()
            .map_err(|e| LedgerError::Internal(format!("Failed to open in-memory SQLite: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), LedgerError> {
        let conn = self.conn.lock()
            .map_err(|e| LedgerError::Internal(format!("Lock poisoned: {}", e)))?;

        schema::init_schema(&conn)?;

        Ok(())
    }

    /// Execute a read operation against the shared connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&Connection) -> Result<T, LedgerError>,
    {
        let conn = self.conn.lock()
            .map_err(|e| LedgerError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Execute a write operation with exclusive access (for transactions)
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Connection) -> Result<T, LedgerError>,
    {
        let mut conn = self.conn.lock()
            .map_err(|e| LedgerError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    /// Get database row counts
    pub fn stats(&self) -> Result<DbStats, LedgerError> {
        self.with_conn(|conn| {
            let user_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

            let forecast_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM forecasts", [], |row| row.get(0))
                .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

            let view_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM views", [], |row| row.get(0))
                .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

            let admin_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))
                .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

            Ok(DbStats {
                user_count: user_count as u64,
                forecast_count: forecast_count as u64,
                view_count: view_count as u64,
                admin_count: admin_count as u64,
            })
        })
    }
}

/// Database row counts
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub user_count: u64,
    pub forecast_count: u64,
    pub view_count: u64,
    pub admin_count: u64,
}

/// True when the error is a SQLite unique/constraint violation
pub(crate) fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Map a rusqlite error, surfacing constraint violations as a distinct kind
pub(crate) fn map_sql_err(context: &str, e: rusqlite::Error) -> LedgerError {
    if is_constraint_violation(&e) {
        LedgerError::Duplicate(format!("{}: {}", context, e))
    } else {
        LedgerError::Internal(format!("{}: {}", context, e))
    }
}

// Re-exports
pub use admins::{is_admin, seed_admins};
pub use forecasts::{CreateForecastInput, ForecastQuery, ForecastRow};
pub use users::{BonusOutcome, DailyBonus, UserRow};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_creates_all_tables() {
        let db = LedgerDb::open_in_memory().unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.user_count, 0);
        assert_eq!(stats.forecast_count, 0);
        assert_eq!(stats.view_count, 0);
        assert_eq!(stats.admin_count, 0);
    }

    #[test]
    fn unique_violation_maps_to_the_duplicate_kind() {
        let db = LedgerDb::open_in_memory().unwrap();
        let err = db
            .with_conn(|conn| {
                conn.execute("INSERT INTO admins (external_id) VALUES (1)", [])
                    .map_err(|e| map_sql_err("Admin insert failed", e))?;
                conn.execute("INSERT INTO admins (external_id) VALUES (1)", [])
                    .map_err(|e| map_sql_err("Admin insert failed", e))?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::Duplicate(_)));
    }

    #[test]
    fn open_is_idempotent_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let db = LedgerDb::open(dir.path()).unwrap();
            db.with_conn_mut(|conn| users::upsert_user(conn, 7, "seven")).unwrap();
        }
        // Reopening must not recreate tables or lose rows
        let db = LedgerDb::open(dir.path()).unwrap();
        assert_eq!(db.stats().unwrap().user_count, 1);
    }
}
