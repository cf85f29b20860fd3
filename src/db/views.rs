//! View dedup records and the view-reward transaction
//!
//! A view row is created exactly once per (user, forecast) pair; the UNIQUE
//! index is the source of truth for "already rewarded". The insert and the
//! balance credit share one transaction: both commit or neither does.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::LedgerError;

use super::map_sql_err;

/// Fixed reward for the first view of a forecast
pub const VIEW_REWARD: i64 = 2;

/// Record a view for (user, forecast) and credit the fixed reward, exactly
/// once per pair ever. Returns false with no balance change when the pair
/// was already recorded.
///
/// Forecast existence is deliberately not checked; views of deleted (or never
/// existing) ids still record and credit, and remain as historical dedup
/// records after catalog deletion.
pub fn record_view(conn: &mut Connection, user_external_id: i64, forecast_id: i64) -> Result<bool, LedgerError> {
    let tx = conn.transaction()
        .map_err(|e| LedgerError::Internal(format!("Transaction failed: {}", e)))?;

    // The credit below targets a user row; refusing unknown users keeps the
    // insert-then-credit pair all-or-nothing instead of silently recording a
    // creditless view.
    let known: Option<i64> = tx
        .query_row(
            "SELECT id FROM users WHERE external_id = ?",
            params![user_external_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| LedgerError::Internal(format!("User lookup failed: {}", e)))?;

    if known.is_none() {
        return Err(LedgerError::NotFound(format!("user {}", user_external_id)));
    }

    let inserted = match tx
        .execute(
            "INSERT INTO views (user_id, forecast_id) VALUES (?, ?)",
            params![user_external_id, forecast_id],
        )
        .map_err(|e| map_sql_err("View insert failed", e))
    {
        Ok(_) => true,
        Err(LedgerError::Duplicate(_)) => false,
        Err(e) => return Err(e),
    };

    if inserted {
        tx.execute(
            "UPDATE users SET balance = balance + ? WHERE external_id = ?",
            params![VIEW_REWARD, user_external_id],
        ).map_err(|e| LedgerError::Internal(format!("Credit failed: {}", e)))?;
    }

    tx.commit()
        .map_err(|e| LedgerError::Internal(format!("Commit failed: {}", e)))?;

    debug!(user_external_id, forecast_id, credited = inserted, "View recorded");

    Ok(inserted)
}

/// Check whether a (user, forecast) pair has already been rewarded
pub fn has_viewed(conn: &Connection, user_external_id: i64, forecast_id: i64) -> Result<bool, LedgerError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM views WHERE user_id = ? AND forecast_id = ?",
            params![user_external_id, forecast_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| LedgerError::Internal(format!("View lookup failed: {}", e)))?;

    Ok(found.is_some())
}
