// ============================================
// Viewer Sessions
// ============================================
//
// One tracker per viewer identity, each persisted under its own storage
// key (`<storage_key>_<escaped viewer_id>`). Trackers are never shared
// across viewers.
//
// Escaping keeps `[A-Za-z0-9-]` and writes every other byte as `_xx`
// (lowercase hex), so distinct ids always map to distinct files.

use super::{BehaviorTracker, FileHistoryStore};
use crate::utils::Clock;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub type SharedTracker = Arc<Mutex<BehaviorTracker>>;

pub struct ViewerSessions {
    history_dir: PathBuf,
    storage_key: String,
    clock: Arc<dyn Clock>,
    trackers: DashMap<String, SharedTracker>,
}

impl ViewerSessions {
    pub fn new(history_dir: impl Into<PathBuf>, storage_key: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            history_dir: history_dir.into(),
            storage_key: storage_key.to_string(),
            clock,
            trackers: DashMap::new(),
        }
    }

    pub fn storage_key_for(&self, viewer_id: &str) -> String {
        let mut key = String::with_capacity(self.storage_key.len() + 1 + viewer_id.len());
        key.push_str(&self.storage_key);
        key.push('_');
        for byte in viewer_id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                key.push(char::from(byte));
            } else {
                key.push_str(&format!("_{:02x}", byte));
            }
        }
        key
    }

    /// Existing tracker for the viewer, or a freshly opened one
    pub fn tracker(&self, viewer_id: &str) -> SharedTracker {
        if let Some(existing) = self.trackers.get(viewer_id) {
            return Arc::clone(existing.value());
        }

        // Load from disk without holding the shard lock
        debug!(viewer_id = viewer_id, "Opening viewer session");
        let store = FileHistoryStore::new(&self.history_dir, &self.storage_key_for(viewer_id));
        let opened = Arc::new(Mutex::new(BehaviorTracker::open(
            Arc::new(store),
            Arc::clone(&self.clock),
        )));

        // A concurrent open of the same viewer may have won; keep that one
        let entry = self
            .trackers
            .entry(viewer_id.to_string())
            .or_insert(opened);
        Arc::clone(entry.value())
    }

    /// Close and forget the viewer's tracker; persisted history is kept
    pub fn end_session(&self, viewer_id: &str) -> bool {
        match self.trackers.remove(viewer_id) {
            Some((_, tracker)) => {
                if let Ok(mut tracker) = tracker.lock() {
                    tracker.close();
                }
                true
            }
            None => false,
        }
    }

    pub fn active_viewers(&self) -> usize {
        self.trackers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdCategory;
    use crate::utils::FixedClock;

    fn sessions(dir: &std::path::Path) -> ViewerSessions {
        ViewerSessions::new(
            dir,
            "ad_user_behavior",
            Arc::new(FixedClock::from_millis(1_700_000_000_000)),
        )
    }

    #[test]
    fn test_viewers_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions(dir.path());

        sessions
            .tracker("alice")
            .lock()
            .unwrap()
            .record_click("ad-1", AdCategory::Technology)
            .unwrap();

        assert_eq!(sessions.tracker("alice").lock().unwrap().history().clicks.len(), 1);
        assert!(sessions.tracker("bob").lock().unwrap().history().is_empty());
        assert_eq!(sessions.active_viewers(), 2);
    }

    #[test]
    fn test_end_session_keeps_persisted_history() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions(dir.path());

        let tracker = sessions.tracker("carol");
        tracker
            .lock()
            .unwrap()
            .record_view("ad-2", AdCategory::Fashion, Some(3.0))
            .unwrap();

        assert!(sessions.end_session("carol"));
        assert!(!tracker.lock().unwrap().is_open());
        assert!(!sessions.end_session("carol"));

        let reopened = sessions.tracker("carol");
        assert_eq!(reopened.lock().unwrap().history().views.len(), 1);
    }

    #[test]
    fn test_storage_key_is_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions(dir.path());

        assert_eq!(
            sessions.storage_key_for("../evil/id"),
            "ad_user_behavior__2e_2e_2fevil_2fid"
        );
        assert_eq!(sessions.storage_key_for("bob-42"), "ad_user_behavior_bob-42");
    }

    #[test]
    fn test_similar_viewer_ids_get_distinct_keys() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions(dir.path());

        let ids = ["alice.smith", "alice_smith", "alice/smith", "alice_2esmith"];
        let keys: std::collections::HashSet<_> =
            ids.iter().map(|id| sessions.storage_key_for(id)).collect();

        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_similar_viewer_ids_do_not_share_history() {
        let dir = tempfile::tempdir().unwrap();

        sessions(dir.path())
            .tracker("alice.smith")
            .lock()
            .unwrap()
            .record_click("ad-1", AdCategory::Technology)
            .unwrap();

        let reopened = sessions(dir.path());
        assert!(reopened.tracker("alice_smith").lock().unwrap().history().is_empty());
        assert_eq!(
            reopened.tracker("alice.smith").lock().unwrap().history().clicks.len(),
            1
        );
    }

    #[test]
    fn test_repeated_lookup_returns_same_tracker() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = sessions(dir.path());

        let first = sessions.tracker("dave");
        let second = sessions.tracker("dave");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(sessions.active_viewers(), 1);
    }
}
