//! View types for the mini-app API boundary
//!
//! These types use camelCase serialization for TypeScript clients.
//! Storage rows in `db/` use snake_case field names for SQL compatibility.
//!
//! Pattern:
//! - Service layer returns row types (UserRow, ForecastRow, ...)
//! - The shell converts to View types before serializing to clients
//! - ts-rs generates camelCase TypeScript from View types
//!
//! Dates cross the boundary as plain strings: `YYYY-MM-DD` for calendar
//! dates, SQLite `datetime('now')` text for timestamps.

use serde::Serialize;
use ts_rs::TS;

use crate::db::users::{DailyBonus, UserRow};
use crate::db::ForecastRow;
use crate::services::AdminStats;

fn format_date(d: &chrono::NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserView {
    pub external_id: i64,
    pub display_name: Option<String>,
    pub balance: i64,
    pub daily_streak: i64,
    pub last_daily: Option<String>,
    pub vip_expiry: Option<String>,
    pub created_at: String,
}

impl From<UserRow> for UserView {
    fn from(u: UserRow) -> Self {
        Self {
            external_id: u.external_id,
            display_name: u.display_name,
            balance: u.balance,
            daily_streak: u.daily_streak,
            last_daily: u.last_daily.as_ref().map(format_date),
            vip_expiry: u.vip_expiry.as_ref().map(format_date),
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ForecastView {
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

impl From<ForecastRow> for ForecastView {
    fn from(f: ForecastRow) -> Self {
        Self {
            id: f.id,
            sport: f.sport,
            league: f.league,
            match_label: f.match_label,
            prediction: f.prediction,
            coefficient: f.coefficient,
            confidence: f.confidence,
            comment: f.comment,
            is_vip: f.is_vip,
            created_at: f.created_at,
            match_time: f.match_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyBonusView {
    pub credited: i64,
    pub streak: i64,
    /// Outcome tag for the bot message: first_claim, streak_continued,
    /// weekly_milestone, streak_reset, already_claimed_today
    pub outcome: String,
}

impl From<DailyBonus> for DailyBonusView {
    fn from(b: DailyBonus) -> Self {
        Self {
            credited: b.credited,
            streak: b.streak,
            outcome: b.outcome.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminStatsView {
    pub total_users: i64,
    pub new_users_today: i64,
    pub total_forecasts: i64,
    pub vip_forecasts: i64,
    pub total_balance: i64,
}

impl From<AdminStats> for AdminStatsView {
    fn from(s: AdminStats) -> Self {
        Self {
            total_users: s.total_users,
            new_users_today: s.new_users_today,
            total_forecasts: s.total_forecasts,
            vip_forecasts: s.vip_forecasts,
            total_balance: s.total_balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::BonusOutcome;
    use chrono::NaiveDate;

    #[test]
    fn user_view_serializes_camel_case_with_formatted_dates() {
        let view = UserView::from(UserRow {
            id: 1,
            external_id: 42,
            display_name: Some("alice".to_string()),
            balance: 12,
            daily_streak: 3,
            last_daily: NaiveDate::from_ymd_opt(2024, 3, 1),
            vip_expiry: None,
            created_at: "2024-02-20 10:00:00".to_string(),
        });

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["externalId"], 42);
        assert_eq!(json["dailyStreak"], 3);
        assert_eq!(json["lastDaily"], "2024-03-01");
        assert!(json["vipExpiry"].is_null());
    }

    #[test]
    fn bonus_view_exposes_the_outcome_tag() {
        let view = DailyBonusView::from(DailyBonus {
            credited: 25,
            streak: 7,
            outcome: BonusOutcome::WeeklyMilestone,
        });

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["credited"], 25);
        assert_eq!(json["outcome"], "weekly_milestone");
    }

    #[test]
    fn forecast_view_keeps_vip_as_proper_bool() {
        let view = ForecastView::from(ForecastRow {
            id: 5,
            sport: "football".to_string(),
            league: None,
            match_label: "A vs B".to_string(),
            prediction: "2".to_string(),
            coefficient: 2.4,
            confidence: 70,
            comment: None,
            is_vip: true,
            created_at: "2024-03-01 12:00:00".to_string(),
            match_time: None,
        });

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["isVip"], true);
        assert_eq!(json["matchLabel"], "A vs B");
    }
}
