//! Forecast catalog CRUD operations

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LedgerError;

/// Forecast row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRow {
    pub id: i64,
    pub sport: String,
    pub league: Option<String>,
    pub match_label: String,
    pub prediction: String,
    pub coefficient: f64,
    pub confidence: i64,
    pub comment: Option<String>,
    pub is_vip: bool,
    pub created_at: String,
    pub match_time: Option<String>,
}

impl ForecastRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            sport: row.get("sport")?,
            league: row.get("league")?,
            match_label: row.get("match_label")?,
            prediction: row.get("prediction")?,
            coefficient: row.get("coefficient")?,
            confidence: row.get("confidence")?,
            comment: row.get("comment")?,
            is_vip: row.get("is_vip")?,
            created_at: row.get("created_at")?,
            match_time: row.get("match_time")?,
        })
    }
}

/// Input for creating a forecast
#[derive(Debug, Clone, Deserialize)]
pub struct CreateForecastInput {
    pub sport: String,
    #[serde(default)]
    pub league: Option<String>,
    pub match_label: String,
    pub prediction: String,
    pub coefficient: f64,
    pub confidence: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub match_time: Option<String>,
}

/// Query parameters for listing forecasts - camelCase for URL params
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastQuery {
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub is_vip: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 { 20 }

impl Default for ForecastQuery {
    fn default() -> Self {
        Self {
            sport: None,
            is_vip: None,
            limit: default_limit(),
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, sport, league, match_label, prediction, coefficient, confidence,
     comment, is_vip, created_at, match_time";

/// Get a forecast by id
pub fn get_forecast(conn: &Connection, id: i64) -> Result<Option<ForecastRow>, LedgerError> {
    conn.query_row(
        &format!("SELECT {} FROM forecasts WHERE id = ?", SELECT_COLUMNS),
        params![id],
        |row| ForecastRow::from_row(row),
    )
    .optional()
    .map_err(|e| LedgerError::Internal(format!("Failed to get forecast: {}", e)))
}

/// Create a forecast; the store assigns the next sequential id and stamps
/// created_at.
pub fn create_forecast(conn: &mut Connection, input: &CreateForecastInput) -> Result<ForecastRow, LedgerError> {
    conn.execute(
        r#"
        INSERT INTO forecasts (
            sport, league, match_label, prediction, coefficient,
            confidence, comment, is_vip, match_time
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            input.sport,
            input.league,
            input.match_label,
            input.prediction,
            input.coefficient,
            input.confidence,
            input.comment,
            input.is_vip,
            input.match_time,
        ],
    ).map_err(|e| LedgerError::Internal(format!("Insert failed: {}", e)))?;

    let id = conn.last_insert_rowid();

    get_forecast(conn, id)?
        .ok_or_else(|| LedgerError::Internal("Forecast not found after insert".to_string()))
}

/// Delete a forecast by id. Idempotent: false when the id does not exist,
/// never an error. View records referencing the id are left in place.
pub fn delete_forecast(conn: &mut Connection, id: i64) -> Result<bool, LedgerError> {
    let changes = conn
        .execute("DELETE FROM forecasts WHERE id = ?", params![id])
        .map_err(|e| LedgerError::Internal(format!("Delete failed: {}", e)))?;

    Ok(changes > 0)
}

/// List forecasts with optional AND-combined filters, newest first.
/// The result is a point-in-time snapshot truncated to `limit`.
pub fn list_forecasts(conn: &Connection, query: &ForecastQuery) -> Result<Vec<ForecastRow>, LedgerError> {
    let mut sql = format!("SELECT {} FROM forecasts", SELECT_COLUMNS);
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];
    let mut conditions = vec![];

    if let Some(ref sport) = query.sport {
        conditions.push("sport = ?".to_string());
        params.push(Box::new(sport.clone()));
    }

    if let Some(is_vip) = query.is_vip {
        conditions.push("is_vip = ?".to_string());
        params.push(Box::new(is_vip));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    // created_at has second resolution; id breaks ties so rows created within
    // one granule still come back newest first.
    // LIMIT -1 means unlimited in SQLite; clamp so a negative limit stays a
    // truncation, not an escape hatch.
    sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");
    params.push(Box::new(query.limit.max(0)));

    debug!("Executing query: {}", sql);

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| LedgerError::Internal(format!("Prepare failed: {}", e)))?;

    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let rows = stmt
        .query_map(param_refs.as_slice(), |row| ForecastRow::from_row(row))
        .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| LedgerError::Internal(format!("Row parse failed: {}", e)))
}
