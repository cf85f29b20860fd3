//! Catalog service - forecast curation with validation

use std::sync::Arc;

use crate::db::{forecasts, LedgerDb};
use crate::error::LedgerError;

use super::events::{EventBus, LedgerEvent};

pub use crate::db::forecasts::{CreateForecastInput, ForecastQuery, ForecastRow};

/// Catalog service for forecast curation and retrieval
pub struct CatalogService {
    db: Arc<LedgerDb>,
    events: Arc<EventBus>,
}

impl CatalogService {
    /// Create a new catalog service
    pub fn new(db: Arc<LedgerDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Get a forecast by id
    pub fn get(&self, id: i64) -> Result<Option<ForecastRow>, LedgerError> {
        self.db.with_conn(|conn| forecasts::get_forecast(conn, id))
    }

    /// List forecasts with filters, newest first
    pub fn list(&self, query: &ForecastQuery) -> Result<Vec<ForecastRow>, LedgerError> {
        self.db.with_conn(|conn| forecasts::list_forecasts(conn, query))
    }

    /// Create a forecast with validation
    pub fn create(&self, input: CreateForecastInput) -> Result<ForecastRow, LedgerError> {
        self.validate_forecast(&input)?;

        let result = self.db.with_conn_mut(|conn| {
            forecasts::create_forecast(conn, &input)
        })?;

        self.events.emit(LedgerEvent::ForecastCreated {
            id: result.id,
            sport: result.sport.clone(),
            is_vip: result.is_vip,
        });

        Ok(result)
    }

    /// Delete a forecast. Idempotent; returns false when the id is unknown.
    pub fn delete(&self, id: i64) -> Result<bool, LedgerError> {
        let deleted = self.db.with_conn_mut(|conn| {
            forecasts::delete_forecast(conn, id)
        })?;

        if deleted {
            self.events.emit(LedgerEvent::ForecastDeleted { id });
        }

        Ok(deleted)
    }

    /// Validate forecast input
    fn validate_forecast(&self, input: &CreateForecastInput) -> Result<(), LedgerError> {
        if input.sport.is_empty() {
            return Err(LedgerError::InvalidInput("sport is required".into()));
        }

        if input.match_label.is_empty() {
            return Err(LedgerError::InvalidInput("match_label is required".into()));
        }

        if input.prediction.is_empty() {
            return Err(LedgerError::InvalidInput("prediction is required".into()));
        }

        if !input.coefficient.is_finite() || input.coefficient <= 0.0 {
            return Err(LedgerError::InvalidInput(format!(
                "coefficient must be a positive number, got {}",
                input.coefficient
            )));
        }

        if !(0..=100).contains(&input.confidence) {
            return Err(LedgerError::InvalidInput(format!(
                "confidence must be within 0..=100, got {}",
                input.confidence
            )));
        }

        Ok(())
    }
}
