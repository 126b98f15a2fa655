//! File-backed save slot.

use ludo_core::SaveStore;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Keeps one save in a single JSON file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for FileStore {
    fn read(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Some(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), "failed to read save: {}", e);
                None
            }
        }
    }

    fn write(&mut self, data: String) {
        if let Err(e) = fs::write(&self.path, data) {
            warn!(path = %self.path.display(), "failed to write save: {}", e);
        }
    }

    fn clear(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "failed to remove save: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store() -> FileStore {
        FileStore::new(std::env::temp_dir().join(format!("ludo-{}.json", Uuid::new_v4())))
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let store = temp_store();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn test_write_read_clear() {
        let mut store = temp_store();
        store.write("{\"a\":1}".to_string());
        assert_eq!(store.read().as_deref(), Some("{\"a\":1}"));

        store.clear();
        assert_eq!(store.read(), None);
        assert!(!store.path().exists());
        // Clearing twice is fine
        store.clear();
    }
}
