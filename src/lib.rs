//! Forecast Ledger - points ledger and forecast catalog backend
//!
//! Backs a chat bot and its companion mini-app. Users accrue points through
//! daily check-ins (with a consecutive-day streak) and by viewing curated
//! forecast items exactly once each; administrators curate the catalog and
//! read aggregate counters.
//!
//! ## Architecture
//!
//! - **db** - SQLite tables (users, forecasts, views, admins) behind one
//!   mutex-guarded connection; every read-modify-write runs as a single
//!   transaction, so balance mutations never lose updates
//! - **services** - business logic per domain slice, sharing the `LedgerDb`
//!   handle and emitting audit events on a broadcast bus
//! - **api_views** - camelCase boundary types for the mini-app client
//!
//! The transport shell (bot commands, HTTP routes) lives outside this crate
//! and calls in with already-validated identifiers plus a trusted calendar
//! date for bonus evaluation, which keeps every operation deterministic.
//!
//! ## Reward rules
//!
//! | Action | Credit |
//! |--------|--------|
//! | Daily check-in | 5 |
//! | Every 7th consecutive check-in | 5 + 20 |
//! | First view of a forecast | 2 |
//!
//! Already-claimed and already-viewed are silent outcomes communicated via
//! return values, never errors; only storage faults surface as failures.

pub mod api_views;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

// Re-exports
pub use config::Config;
pub use db::{BonusOutcome, CreateForecastInput, DailyBonus, ForecastQuery, ForecastRow, LedgerDb, UserRow};
pub use error::LedgerError;
pub use services::{
    AccountService, AdminStats, CatalogService, EventBus, LedgerEvent, RewardService, StatsService,
};
