//! Integration tests for the ledger: full user journeys, persistence across
//! reopen, and concurrent reward delivery.

use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use tempfile::TempDir;

use forecast_ledger::{
    AccountService, BonusOutcome, CatalogService, CreateForecastInput, EventBus, ForecastQuery,
    LedgerDb, RewardService, StatsService,
};

struct Ledger {
    accounts: AccountService,
    catalog: CatalogService,
    rewards: RewardService,
    stats: StatsService,
    db: Arc<LedgerDb>,
}

fn open_ledger(db: Arc<LedgerDb>) -> Ledger {
    let events = Arc::new(EventBus::new());
    Ledger {
        accounts: AccountService::new(db.clone(), events.clone()),
        catalog: CatalogService::new(db.clone(), events.clone()),
        rewards: RewardService::new(db.clone(), events.clone()),
        stats: StatsService::new(db.clone()),
        db,
    }
}

fn in_memory_ledger() -> Ledger {
    open_ledger(Arc::new(LedgerDb::open_in_memory().unwrap()))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn forecast(sport: &str, vip: bool) -> CreateForecastInput {
    CreateForecastInput {
        sport: sport.to_string(),
        league: Some("Test League".to_string()),
        match_label: "Home vs Away".to_string(),
        prediction: "1X".to_string(),
        coefficient: 1.85,
        confidence: 80,
        comment: None,
        is_vip: vip,
        match_time: None,
    }
}

#[test]
fn full_user_journey_accumulates_the_expected_balance() {
    let ledger = in_memory_ledger();
    let user = 1001;

    // First contact: upsert, then daily claim
    ledger.accounts.upsert_user(user, "alice").unwrap();
    let bonus = ledger.accounts.claim_daily_bonus(user, date(2024, 3, 1)).unwrap();
    assert_eq!(bonus.outcome, BonusOutcome::FirstClaim);
    assert_eq!(bonus.credited, 5);

    // Curator publishes two forecasts; user views both, one of them twice
    let a = ledger.catalog.create(forecast("football", false)).unwrap();
    let b = ledger.catalog.create(forecast("football", true)).unwrap();
    assert!(ledger.rewards.record_view(user, a.id).unwrap());
    assert!(ledger.rewards.record_view(user, b.id).unwrap());
    assert!(!ledger.rewards.record_view(user, a.id).unwrap());

    // 5 (daily) + 2 + 2 (first views)
    assert_eq!(ledger.accounts.get_balance(user).unwrap(), 9);

    // Next-day claim continues the streak
    let next = ledger.accounts.claim_daily_bonus(user, date(2024, 3, 2)).unwrap();
    assert_eq!(next.outcome, BonusOutcome::StreakContinued);
    assert_eq!(next.streak, 2);
    assert_eq!(ledger.accounts.get_balance(user).unwrap(), 14);
}

#[test]
fn catalog_filtering_matches_the_dashboard_counters() {
    let ledger = in_memory_ledger();

    for i in 0..6 {
        ledger.catalog.create(forecast("football", i % 2 == 0)).unwrap();
    }
    ledger.catalog.create(forecast("hockey", true)).unwrap();

    let listed = ledger
        .catalog
        .list(&ForecastQuery {
            sport: Some("football".to_string()),
            is_vip: Some(true),
            limit: 5,
        })
        .unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.iter().all(|f| f.sport == "football" && f.is_vip));
    assert!(listed.windows(2).all(|w| w[0].id > w[1].id));

    let stats = ledger.stats.get_stats(chrono::Utc::now().date_naive()).unwrap();
    assert_eq!(stats.total_forecasts, 7);
    assert_eq!(stats.vip_forecasts, 4);
}

#[test]
fn deleting_a_forecast_leaves_the_dedup_record_in_place() {
    let ledger = in_memory_ledger();
    let user = 7;

    ledger.accounts.upsert_user(user, "bob").unwrap();
    let f = ledger.catalog.create(forecast("football", false)).unwrap();
    assert!(ledger.rewards.record_view(user, f.id).unwrap());

    assert!(ledger.catalog.delete(f.id).unwrap());
    assert!(ledger.catalog.get(f.id).unwrap().is_none());

    // The historical view record still blocks a second credit
    assert!(ledger.rewards.has_viewed(user, f.id).unwrap());
    assert!(!ledger.rewards.record_view(user, f.id).unwrap());
    assert_eq!(ledger.accounts.get_balance(user).unwrap(), 2);
}

#[test]
fn ledger_state_survives_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let ledger = open_ledger(Arc::new(LedgerDb::open(dir.path()).unwrap()));
        ledger.accounts.upsert_user(5, "carol").unwrap();
        ledger.accounts.claim_daily_bonus(5, date(2024, 3, 1)).unwrap();
        ledger.catalog.create(forecast("tennis", false)).unwrap();
        ledger.stats.seed_admins(&[99]).unwrap();
    }

    let ledger = open_ledger(Arc::new(LedgerDb::open(dir.path()).unwrap()));
    assert_eq!(ledger.accounts.get_balance(5).unwrap(), 5);
    assert!(ledger.stats.is_admin(99).unwrap());

    // Same-day re-claim after restart still credits nothing
    let again = ledger.accounts.claim_daily_bonus(5, date(2024, 3, 1)).unwrap();
    assert_eq!(again.outcome, BonusOutcome::AlreadyClaimedToday);
    assert_eq!(again.credited, 0);
}

#[test]
fn concurrent_views_of_one_pair_credit_exactly_once() {
    let db = Arc::new(LedgerDb::open_in_memory().unwrap());
    let ledger = open_ledger(db.clone());
    ledger.accounts.upsert_user(1, "racer").unwrap();
    let f = ledger.catalog.create(forecast("football", false)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = db.clone();
            let forecast_id = f.id;
            thread::spawn(move || {
                let events = Arc::new(EventBus::new());
                let rewards = RewardService::new(db, events);
                rewards.record_view(1, forecast_id).unwrap()
            })
        })
        .collect();

    let credited = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&c| c)
        .count();

    assert_eq!(credited, 1);
    assert_eq!(ledger.accounts.get_balance(1).unwrap(), 2);
    assert_eq!(ledger.db.stats().unwrap().view_count, 1);
}

#[test]
fn concurrent_claims_for_one_user_credit_once_per_day() {
    let db = Arc::new(LedgerDb::open_in_memory().unwrap());
    let ledger = open_ledger(db.clone());
    let today = date(2024, 3, 1);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = db.clone();
            thread::spawn(move || {
                let events = Arc::new(EventBus::new());
                let accounts = AccountService::new(db, events);
                accounts.claim_daily_bonus(3, today).unwrap().credited
            })
        })
        .collect();

    let total: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(total, 5);
    assert_eq!(ledger.accounts.get_balance(3).unwrap(), 5);
}
