// ============================================
// History Store
// ============================================
//
// Raw persistence of the serialized interaction history, one document per
// storage key. Parsing happens in the tracker so a corrupt document can be
// replaced by an empty history instead of failing the caller.

use super::{Result, TrackingError};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

pub const DEFAULT_STORAGE_KEY: &str = "ad_user_behavior";

pub trait HistoryStore: Send + Sync {
    /// `None` when nothing has been persisted under this key
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, document: &str) -> Result<()>;

    fn remove(&self) -> Result<()>;
}

/// `<dir>/<storage_key>.json`
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(dir: impl AsRef<Path>, storage_key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", storage_key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(document) => Ok(Some(document)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TrackingError::Storage(e.to_string())),
        }
    }

    fn save(&self, document: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TrackingError::Storage(e.to_string()))?;
        }

        // Write-then-rename so readers never see a half-written document
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, document).map_err(|e| TrackingError::Storage(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| TrackingError::Storage(e.to_string()))?;

        debug!(path = %self.path.display(), bytes = document.len(), "History persisted");
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrackingError::Storage(e.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    document: Mutex<Option<String>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
        }
    }

    pub fn document(&self) -> Option<String> {
        self.document
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn load(&self) -> Result<Option<String>> {
        let guard = self
            .document
            .lock()
            .map_err(|e| TrackingError::Storage(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, document: &str) -> Result<()> {
        let mut guard = self
            .document
            .lock()
            .map_err(|e| TrackingError::Storage(e.to_string()))?;
        *guard = Some(document.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let mut guard = self
            .document
            .lock()
            .map_err(|e| TrackingError::Storage(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path(), DEFAULT_STORAGE_KEY);

        assert_eq!(store.load().unwrap(), None);

        store.save(r#"{"views":[],"clicks":[]}"#).unwrap();
        assert!(store.path().ends_with("ad_user_behavior.json"));
        assert_eq!(
            store.load().unwrap().as_deref(),
            Some(r#"{"views":[],"clicks":[]}"#)
        );

        store.remove().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Removing twice is not an error
        store.remove().unwrap();
    }

    #[test]
    fn test_file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path().join("nested/viewer"), "key");

        store.save("{}").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryHistoryStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save("doc").unwrap();
        assert_eq!(store.document().as_deref(), Some("doc"));

        store.remove().unwrap();
        assert_eq!(store.document(), None);
    }
}
