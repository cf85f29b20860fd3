//! Forecast Ledger operator CLI
//!
//! Small curation and inspection tool over the ledger database. The bot and
//! mini-app shells link the library directly; this binary covers the admin
//! tasks that don't need them.
//!
//! ## Usage
//!
//! ```bash
//! # Dashboard counters
//! forecast-ledger stats
//!
//! # Curate the catalog
//! forecast-ledger add-forecast --sport football --match-label "Home vs Away" \
//!     --prediction "1X" --coefficient 1.85 --confidence 80 --vip
//! forecast-ledger list-forecasts --sport football --vip true --limit 5
//! forecast-ledger delete-forecast 3
//!
//! # Point at another data directory
//! forecast-ledger --data-dir /srv/ledger stats
//! ```
//!
//! The admin allow-list is re-seeded from config/CLI on every start
//! (insert-or-ignore, so this is idempotent).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use forecast_ledger::api_views::{AdminStatsView, ForecastView};
use forecast_ledger::services::{EventListener, LoggingEventListener};
use forecast_ledger::{
    CatalogService, Config, CreateForecastInput, EventBus, ForecastQuery, LedgerDb, StatsService,
};

#[derive(Parser, Debug)]
#[command(name = "forecast-ledger")]
#[command(about = "Points ledger and forecast catalog backend")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory holding the ledger database
    #[arg(long, env = "LEDGER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Admin allow-list (comma-separated external account ids)
    #[arg(long, env = "ADMIN_IDS", value_delimiter = ',')]
    admin_ids: Vec<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the dashboard counters as JSON
    Stats,
    /// Add a forecast to the catalog
    AddForecast {
        #[arg(long)]
        sport: String,
        #[arg(long)]
        league: Option<String>,
        #[arg(long)]
        match_label: String,
        #[arg(long)]
        prediction: String,
        #[arg(long)]
        coefficient: f64,
        #[arg(long)]
        confidence: i64,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        vip: bool,
        /// Scheduled event time, e.g. "2024-03-02 18:00:00"
        #[arg(long)]
        match_time: Option<String>,
    },
    /// List forecasts, newest first
    ListForecasts {
        #[arg(long)]
        sport: Option<String>,
        #[arg(long)]
        vip: Option<bool>,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Delete a forecast (no-op when the id is unknown)
    DeleteForecast { id: i64 },
    /// Check allow-list membership for an external account id
    IsAdmin { external_id: i64 },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("forecast_ledger=info".parse()?),
        )
        .init();

    let args = Args::parse();

    // Load config; without --config, fall back to the well-known location
    // under the default data directory when a file exists there.
    let mut config = match &args.config {
        Some(config_path) => Config::load(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?,
        None => {
            let default_path = Config::default().config_path();
            if default_path.exists() {
                Config::load(&default_path)
                    .with_context(|| format!("Failed to load config from {:?}", default_path))?
            } else {
                Config::default()
            }
        }
    };

    // Apply CLI overrides
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if !args.admin_ids.is_empty() {
        config.admin_ids = args.admin_ids;
    }

    info!(data_dir = %config.data_dir.display(), "Starting forecast-ledger");

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create {:?}", config.data_dir))?;

    let db = Arc::new(LedgerDb::open(&config.data_dir)?);
    let events = Arc::new(EventBus::new());
    let mut audit = events.subscribe();

    let stats = StatsService::new(db.clone());
    let catalog = CatalogService::new(db.clone(), events.clone());

    // Seed the allow-list on every start
    stats.seed_admins(&config.admin_ids)?;

    match args.command {
        Command::Stats => {
            let view = AdminStatsView::from(stats.get_stats(Utc::now().date_naive())?);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::AddForecast {
            sport,
            league,
            match_label,
            prediction,
            coefficient,
            confidence,
            comment,
            vip,
            match_time,
        } => {
            let created = catalog.create(CreateForecastInput {
                sport,
                league,
                match_label,
                prediction,
                coefficient,
                confidence,
                comment,
                is_vip: vip,
                match_time,
            })?;
            println!("{}", serde_json::to_string_pretty(&ForecastView::from(created))?);
        }
        Command::ListForecasts { sport, vip, limit } => {
            let mut query = ForecastQuery {
                sport,
                is_vip: vip,
                ..Default::default()
            };
            query.limit = limit.unwrap_or(config.list_limit);

            let listed: Vec<ForecastView> = catalog
                .list(&query)?
                .into_iter()
                .map(ForecastView::from)
                .collect();
            println!("{}", serde_json::to_string_pretty(&listed)?);
        }
        Command::DeleteForecast { id } => {
            let deleted = catalog.delete(id)?;
            if deleted {
                println!("deleted forecast {}", id);
            } else {
                println!("forecast {} not found (nothing to do)", id);
            }
        }
        Command::IsAdmin { external_id } => {
            println!("{}", stats.is_admin(external_id)?);
        }
    }

    // Drain the audit trail for whatever the command emitted. A one-shot CLI
    // has no runtime, so the listener runs synchronously here.
    let listener = LoggingEventListener;
    while let Ok(event) = audit.try_recv() {
        listener.on_event(&event);
    }

    Ok(())
}
