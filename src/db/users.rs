//! User account operations: upsert, balance lookups, and the daily-bonus
//! streak state machine.
//!
//! The claim algorithm is evaluated against a caller-supplied calendar date,
//! never the wall clock, so it stays deterministic under test and immune to
//! timezone/DST drift. Comparisons are calendar-day comparisons, not elapsed
//! durations.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LedgerError;

use super::map_sql_err;

/// Base points for a successful daily claim
pub const DAILY_BASE_BONUS: i64 = 5;

/// Extra points on every 7th consecutive claim
pub const WEEKLY_MILESTONE_BONUS: i64 = 20;

/// Stored date format for `last_daily` / `vip_expiry`
const DATE_FORMAT: &str = "%Y-%m-%d";

/// User row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: i64,
    pub external_id: i64,
    pub display_name: Option<String>,
    pub balance: i64,
    pub daily_streak: i64,
    pub last_daily: Option<NaiveDate>,
    pub vip_expiry: Option<NaiveDate>,
    pub created_at: String,
}

impl UserRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        let last_daily: Option<String> = row.get("last_daily")?;
        let vip_expiry: Option<String> = row.get("vip_expiry")?;
        Ok(Self {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            display_name: row.get("display_name")?,
            balance: row.get("balance")?,
            daily_streak: row.get("daily_streak")?,
            last_daily: last_daily.and_then(|s| parse_date(&s)),
            vip_expiry: vip_expiry.and_then(|s| parse_date(&s)),
            created_at: row.get("created_at")?,
        })
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// How a daily-bonus claim resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusOutcome {
    /// First claim ever for this user
    FirstClaim,
    /// Claimed yesterday too; streak extended
    StreakContinued,
    /// Streak extended onto a multiple of 7; weekly bonus added
    WeeklyMilestone,
    /// Gap of two or more days; streak restarted at 1
    StreakReset,
    /// Already claimed for this date; nothing credited
    AlreadyClaimedToday,
}

impl BonusOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusOutcome::FirstClaim => "first_claim",
            BonusOutcome::StreakContinued => "streak_continued",
            BonusOutcome::WeeklyMilestone => "weekly_milestone",
            BonusOutcome::StreakReset => "streak_reset",
            BonusOutcome::AlreadyClaimedToday => "already_claimed_today",
        }
    }
}

/// Result of a daily-bonus claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyBonus {
    /// Points credited by this call (0 when already claimed today)
    pub credited: i64,
    /// Streak value after the call
    pub streak: i64,
    pub outcome: BonusOutcome,
}

/// Create the user if absent, otherwise overwrite the display name.
/// Safe to call on every contact.
pub fn upsert_user(conn: &mut Connection, external_id: i64, display_name: &str) -> Result<(), LedgerError> {
    let tx = conn.transaction()
        .map_err(|e| LedgerError::Internal(format!("Transaction failed: {}", e)))?;

    tx.execute(
        "INSERT OR IGNORE INTO users (external_id, display_name) VALUES (?, ?)",
        params![external_id, display_name],
    ).map_err(|e| map_sql_err("User insert failed", e))?;

    tx.execute(
        "UPDATE users SET display_name = ? WHERE external_id = ?",
        params![display_name, external_id],
    ).map_err(|e| map_sql_err("User update failed", e))?;

    tx.commit()
        .map_err(|e| LedgerError::Internal(format!("Commit failed: {}", e)))?;

    Ok(())
}

/// Get a user by external id
pub fn get_user(conn: &Connection, external_id: i64) -> Result<Option<UserRow>, LedgerError> {
    conn.query_row(
        "SELECT id, external_id, display_name, balance, daily_streak, last_daily,
                vip_expiry, created_at
         FROM users WHERE external_id = ?",
        params![external_id],
        |row| UserRow::from_row(row),
    )
    .optional()
    .map_err(|e| LedgerError::Internal(format!("Failed to get user: {}", e)))
}

/// Get a user's balance; 0 for unknown users, with no implicit creation
pub fn get_balance(conn: &Connection, external_id: i64) -> Result<i64, LedgerError> {
    let balance: Option<i64> = conn
        .query_row(
            "SELECT balance FROM users WHERE external_id = ?",
            params![external_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| LedgerError::Internal(format!("Failed to get balance: {}", e)))?;

    Ok(balance.unwrap_or(0))
}

/// Claim the daily bonus for `today`, evaluated against the stored streak
/// state. At most one credit per calendar day per user; a duplicate same-day
/// call is a silent zero-credit outcome, not an error.
///
/// Read, compute, and write happen in one transaction so concurrent claims
/// for the same user cannot double-credit.
pub fn claim_daily(conn: &mut Connection, external_id: i64, today: NaiveDate) -> Result<DailyBonus, LedgerError> {
    let tx = conn.transaction()
        .map_err(|e| LedgerError::Internal(format!("Transaction failed: {}", e)))?;

    // Unknown users start at streak 0 with no prior claim; the row has to
    // exist for the persist step below.
    tx.execute(
        "INSERT OR IGNORE INTO users (external_id) VALUES (?)",
        params![external_id],
    ).map_err(|e| map_sql_err("User insert failed", e))?;

    let (streak, last_daily): (i64, Option<String>) = tx
        .query_row(
            "SELECT daily_streak, last_daily FROM users WHERE external_id = ?",
            params![external_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|e| LedgerError::Internal(format!("Failed to read claim state: {}", e)))?;

    let last_daily = last_daily.as_deref().and_then(parse_date);
    let yesterday = today.pred_opt();

    let (credited, new_streak, outcome) = match last_daily {
        Some(d) if d == today => (0, streak, BonusOutcome::AlreadyClaimedToday),
        Some(d) if Some(d) == yesterday => {
            let s = streak + 1;
            if s % 7 == 0 {
                (DAILY_BASE_BONUS + WEEKLY_MILESTONE_BONUS, s, BonusOutcome::WeeklyMilestone)
            } else {
                (DAILY_BASE_BONUS, s, BonusOutcome::StreakContinued)
            }
        }
        Some(_) => (DAILY_BASE_BONUS, 1, BonusOutcome::StreakReset),
        None => (DAILY_BASE_BONUS, 1, BonusOutcome::FirstClaim),
    };

    if credited > 0 {
        tx.execute(
            "UPDATE users SET balance = balance + ?, daily_streak = ?, last_daily = ?
             WHERE external_id = ?",
            params![
                credited,
                new_streak,
                today.format(DATE_FORMAT).to_string(),
                external_id
            ],
        ).map_err(|e| LedgerError::Internal(format!("Claim update failed: {}", e)))?;
    }

    tx.commit()
        .map_err(|e| LedgerError::Internal(format!("Commit failed: {}", e)))?;

    debug!(
        external_id,
        credited,
        streak = new_streak,
        outcome = outcome.as_str(),
        "Daily bonus evaluated"
    );

    Ok(DailyBonus { credited, streak: new_streak, outcome })
}
