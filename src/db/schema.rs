//! Database schema definitions

use rusqlite::Connection;
use tracing::info;

use crate::error::LedgerError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<(), LedgerError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        create_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!("Migrating schema from v{} to v{}", current_version, SCHEMA_VERSION);
        migrate_schema(conn, current_version)?;
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &Connection) -> Result<i32, LedgerError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    ).map_err(|e| LedgerError::Internal(format!("Failed to create schema_version table: {}", e)))?;

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    Ok(version)
}

/// Set schema version
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), LedgerError> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| LedgerError::Internal(format!("Failed to clear schema_version: {}", e)))?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?)", [version])
        .map_err(|e| LedgerError::Internal(format!("Failed to set schema_version: {}", e)))?;
    Ok(())
}

/// Create all tables
fn create_tables(conn: &Connection) -> Result<(), LedgerError> {
    conn.execute_batch(LEDGER_SCHEMA)
        .map_err(|e| LedgerError::Internal(format!("Failed to create ledger tables: {}", e)))?;

    conn.execute_batch(INDEXES_SCHEMA)
        .map_err(|e| LedgerError::Internal(format!("Failed to create indexes: {}", e)))?;

    Ok(())
}

/// Migrate schema from older version
fn migrate_schema(conn: &Connection, from_version: i32) -> Result<(), LedgerError> {
    // Add migration steps here as schema evolves
    match from_version {
        _ => {}
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

/// Ledger table schema
const LEDGER_SCHEMA: &str = r#"
-- User accounts, keyed by the external (chat) account id.
-- Balance is credit-only in this core: daily bonus and view rewards.
-- last_daily holds the calendar date of the most recent successful claim.
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id INTEGER UNIQUE NOT NULL,
    display_name TEXT,
    balance INTEGER NOT NULL DEFAULT 0,
    daily_streak INTEGER NOT NULL DEFAULT 0,
    last_daily TEXT,
    vip_expiry TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Curated forecast catalog. Rows are immutable except for deletion.
-- AUTOINCREMENT keeps ids monotonically increasing and never reused.
CREATE TABLE IF NOT EXISTS forecasts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sport TEXT NOT NULL,
    league TEXT,
    match_label TEXT NOT NULL,
    prediction TEXT NOT NULL,
    coefficient REAL NOT NULL,
    confidence INTEGER NOT NULL,
    comment TEXT,
    is_vip INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    match_time TEXT
);

-- View dedup records: at most one row per (user, forecast) pair, ever.
-- user_id is the external account id.
-- NOTE: No FK constraint on forecast_id; views survive forecast deletion
-- as historical dedup records.
CREATE TABLE IF NOT EXISTS views (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    forecast_id INTEGER NOT NULL,
    viewed_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (user_id, forecast_id)
);

-- Administrator allow-list, seeded at startup (insert-or-ignore)
CREATE TABLE IF NOT EXISTS admins (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id INTEGER UNIQUE NOT NULL
);
"#;

/// Index definitions for fast queries
const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_forecasts_sport ON forecasts(sport);
CREATE INDEX IF NOT EXISTS idx_forecasts_is_vip ON forecasts(is_vip);
CREATE INDEX IF NOT EXISTS idx_forecasts_created_at ON forecasts(created_at);

CREATE INDEX IF NOT EXISTS idx_views_forecast_id ON views(forecast_id);

CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at);
"#;
