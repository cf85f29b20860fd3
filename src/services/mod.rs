//! Service layer - business logic over the storage modules
//!
//! Each service owns one slice of the core: accounts and the daily-bonus
//! state machine, the forecast catalog, view rewards, and admin statistics.
//! Services share the `LedgerDb` handle and never call each other.

pub mod account_service;
pub mod catalog_service;
pub mod events;
pub mod reward_service;
pub mod stats_service;

pub use account_service::AccountService;
pub use catalog_service::CatalogService;
pub use events::{EventBus, EventListener, LedgerEvent, LoggingEventListener};
pub use reward_service::RewardService;
pub use stats_service::{AdminStats, StatsService};
