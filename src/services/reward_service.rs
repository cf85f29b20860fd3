//! Reward service - exactly-once view rewards

use std::sync::Arc;

use crate::db::{views, LedgerDb};
use crate::error::LedgerError;

use super::events::{EventBus, LedgerEvent};

pub use crate::db::views::VIEW_REWARD;

/// Reward service for first-view credits
pub struct RewardService {
    db: Arc<LedgerDb>,
    events: Arc<EventBus>,
}

impl RewardService {
    /// Create a new reward service
    pub fn new(db: Arc<LedgerDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Record a view and credit the fixed reward on the first occurrence of
    /// the (user, forecast) pair. Returns whether this call credited.
    /// A repeated view is a normal false outcome, not an error.
    pub fn record_view(&self, user_external_id: i64, forecast_id: i64) -> Result<bool, LedgerError> {
        let credited = self.db.with_conn_mut(|conn| {
            views::record_view(conn, user_external_id, forecast_id)
        })?;

        if credited {
            self.events.emit(LedgerEvent::ViewRewarded {
                user_id: user_external_id,
                forecast_id,
            });
        }

        Ok(credited)
    }

    /// Whether the pair has already been rewarded
    pub fn has_viewed(&self, user_external_id: i64, forecast_id: i64) -> Result<bool, LedgerError> {
        self.db.with_conn(|conn| views::has_viewed(conn, user_external_id, forecast_id))
    }
}
