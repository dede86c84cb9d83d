// ============================================
// Behavior Tracking Module
// ============================================
//
// Owns one viewer's interaction history for a session:
// 1. Load the persisted snapshot on open (empty on missing/corrupt data)
// 2. Append view/click events stamped by the injected clock
// 3. Write through to the store after every append or clear
//
// The history is replaced wholesale on each change; snapshots handed out
// by `history()` never change underneath their holder.

pub mod sessions;
pub mod store;

pub use sessions::ViewerSessions;
pub use store::{FileHistoryStore, HistoryStore, InMemoryHistoryStore, DEFAULT_STORAGE_KEY};

use crate::models::{AdCategory, ClickEvent, InteractionHistory, ViewEvent};
use crate::utils::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_VIEW_DURATION_SECS: f64 = 1.0;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Tracking session {0} is closed")]
    SessionClosed(Uuid),

    #[error("Invalid view duration: {0}")]
    InvalidDuration(f64),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, TrackingError>;

pub struct BehaviorTracker {
    session_id: Uuid,
    store: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
    history: Arc<InteractionHistory>,
    open: bool,
}

impl BehaviorTracker {
    /// Start a session from whatever the store holds
    pub fn open(store: Arc<dyn HistoryStore>, clock: Arc<dyn Clock>) -> Self {
        let session_id = Uuid::new_v4();
        let history = load_history(store.as_ref(), session_id);

        info!(
            session_id = %session_id,
            views = history.views.len(),
            clicks = history.clicks.len(),
            "Behavior tracking session opened"
        );

        Self {
            session_id,
            store,
            clock,
            history: Arc::new(history),
            open: true,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current snapshot
    pub fn history(&self) -> Arc<InteractionHistory> {
        Arc::clone(&self.history)
    }

    /// `duration` is in seconds and defaults to 1
    pub fn record_view(
        &mut self,
        ad_id: &str,
        category: AdCategory,
        duration: Option<f64>,
    ) -> Result<()> {
        self.ensure_open()?;

        let duration = duration.unwrap_or(DEFAULT_VIEW_DURATION_SECS);
        if !duration.is_finite() || duration < 0.0 {
            return Err(TrackingError::InvalidDuration(duration));
        }

        let event = ViewEvent {
            ad_id: ad_id.to_string(),
            category,
            timestamp: self.clock.now().timestamp_millis(),
            duration,
        };

        let mut next = InteractionHistory::clone(&self.history);
        next.views.push(event);
        self.replace(next);

        debug!(
            session_id = %self.session_id,
            ad_id = ad_id,
            category = %category,
            duration = duration,
            "View recorded"
        );

        Ok(())
    }

    pub fn record_click(&mut self, ad_id: &str, category: AdCategory) -> Result<()> {
        self.ensure_open()?;

        let event = ClickEvent {
            ad_id: ad_id.to_string(),
            category,
            timestamp: self.clock.now().timestamp_millis(),
        };

        let mut next = InteractionHistory::clone(&self.history);
        next.clicks.push(event);
        self.replace(next);

        debug!(
            session_id = %self.session_id,
            ad_id = ad_id,
            category = %category,
            "Click recorded"
        );

        Ok(())
    }

    /// Reset to the empty history and drop the persisted document
    pub fn clear_history(&mut self) -> Result<()> {
        self.ensure_open()?;

        self.history = Arc::new(InteractionHistory::default());
        if let Err(e) = self.store.remove() {
            error!(session_id = %self.session_id, error = %e, "Failed to remove persisted history");
        }

        info!(session_id = %self.session_id, "Interaction history cleared");
        Ok(())
    }

    pub fn close(&mut self) {
        if self.open {
            self.open = false;
            info!(session_id = %self.session_id, "Behavior tracking session closed");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(TrackingError::SessionClosed(self.session_id))
        }
    }

    fn replace(&mut self, next: InteractionHistory) {
        self.history = Arc::new(next);
        self.persist();
    }

    /// Write-through. Failures are logged, never returned.
    fn persist(&self) {
        let result = serde_json::to_string(self.history.as_ref())
            .map_err(|e| TrackingError::Serialization(e.to_string()))
            .and_then(|document| self.store.save(&document));

        if let Err(e) = result {
            error!(session_id = %self.session_id, error = %e, "Failed to persist history");
        }
    }
}

fn load_history(store: &dyn HistoryStore, session_id: Uuid) -> InteractionHistory {
    let document = match store.load() {
        Ok(Some(document)) => document,
        Ok(None) => return InteractionHistory::default(),
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Failed to load history, starting empty");
            return InteractionHistory::default();
        }
    };

    match serde_json::from_str(&document) {
        Ok(history) => history,
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Stored history is corrupt, starting empty");
            InteractionHistory::default()
        }
    }
}
