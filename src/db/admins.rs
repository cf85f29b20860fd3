//! Administrator allow-list

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::LedgerError;

/// Seed the allow-list from configured ids. Insert-or-ignore, so re-seeding
/// on every startup is idempotent. Returns the number of newly added admins.
pub fn seed_admins(conn: &Connection, external_ids: &[i64]) -> Result<usize, LedgerError> {
    let mut added = 0;

    for id in external_ids {
        let changes = conn
            .execute(
                "INSERT OR IGNORE INTO admins (external_id) VALUES (?)",
                params![id],
            )
            .map_err(|e| LedgerError::Internal(format!("Admin seed failed: {}", e)))?;
        added += changes;
    }

    if added > 0 {
        info!(added, "Seeded admin allow-list");
    }

    Ok(added)
}

/// Exact-match membership test against the allow-list
pub fn is_admin(conn: &Connection, external_id: i64) -> Result<bool, LedgerError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM admins WHERE external_id = ?",
            params![external_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| LedgerError::Internal(format!("Admin lookup failed: {}", e)))?;

    Ok(found.is_some())
}
