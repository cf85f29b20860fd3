//! Event system for ledger operations
//!
//! Provides an event bus for notifying listeners about ledger operations.
//! Useful for:
//! - Audit logging
//! - Bot notifications (bonus messages, admin alerts)
//! - Cache invalidation in the mini-app shell

use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Ledger events emitted by services
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    // Account events
    UserUpserted {
        external_id: i64,
    },
    DailyBonusClaimed {
        external_id: i64,
        credited: i64,
        streak: i64,
    },

    // Catalog events
    ForecastCreated {
        id: i64,
        sport: String,
        is_vip: bool,
    },
    ForecastDeleted {
        id: i64,
    },

    // Reward events
    ViewRewarded {
        user_id: i64,
        forecast_id: i64,
    },
}

/// Trait for event listeners
pub trait EventListener: Send + Sync {
    /// Handle an event
    fn on_event(&self, event: &LedgerEvent);
}

/// Event bus for broadcasting ledger events
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new event bus with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: LedgerEvent) {
        trace!(event = ?event, "Emitting ledger event");
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging event listener for audit trails
pub struct LoggingEventListener;

impl EventListener for LoggingEventListener {
    fn on_event(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::DailyBonusClaimed { external_id, credited, streak } => {
                debug!(external_id, credited, streak, "Daily bonus claimed");
            }
            LedgerEvent::ForecastCreated { id, sport, is_vip } => {
                debug!(id, sport = %sport, is_vip, "Forecast created");
            }
            LedgerEvent::ViewRewarded { user_id, forecast_id } => {
                debug!(user_id, forecast_id, "View rewarded");
            }
            _ => {
                trace!(event = ?event, "Ledger event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_reaches_subscribers() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        bus.emit(LedgerEvent::DailyBonusClaimed {
            external_id: 1,
            credited: 5,
            streak: 1,
        });

        match receiver.try_recv().expect("receive error") {
            LedgerEvent::DailyBonusClaimed { external_id, credited, .. } => {
                assert_eq!(external_id, 1);
                assert_eq!(credited, 5);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn logging_listener_drains_a_subscription() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        let listener = LoggingEventListener;

        bus.emit(LedgerEvent::UserUpserted { external_id: 1 });
        bus.emit(LedgerEvent::ViewRewarded { user_id: 1, forecast_id: 10 });
        bus.emit(LedgerEvent::ForecastDeleted { id: 3 });

        let mut seen = 0;
        while let Ok(event) = receiver.try_recv() {
            listener.on_event(&event);
            seen += 1;
        }
        assert_eq!(seen, 3);
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.emit(LedgerEvent::ForecastDeleted { id: 1 });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
