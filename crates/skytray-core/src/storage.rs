//! Where the settings record lives.
//!
//! [`SettingsStorage`] deals in raw record text so a rollback can put back
//! exactly the bytes that were there before.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::StorageError;

pub trait SettingsStorage: Send + Sync {
    /// Current record contents, or `None` if nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored record.
    fn write(&self, contents: &str) -> Result<(), StorageError>;

    /// Remove the stored record. Removing a missing record is not an error.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Settings record kept in a JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SettingsStorage for FileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(&self.path, e)),
        }
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        // Ensure config directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        // Write then rename so a crash never leaves a half-written record
        let temp = self.temp_path();
        std::fs::write(&temp, contents).map_err(|e| StorageError::io(&temp, e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| StorageError::io(&self.path, e))?;

        tracing::debug!("Wrote settings to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(&self.path, e)),
        }
    }
}

/// In-memory storage. Writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    contents: Mutex<Option<String>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl SettingsStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents.lock().clone())
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        *self.contents.lock() = Some(contents.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        *self.contents.lock() = None;
        Ok(())
    }
}

/// Shared storage handles can be passed wherever storage is expected.
impl<S: SettingsStorage + ?Sized> SettingsStorage for std::sync::Arc<S> {
    fn read(&self) -> Result<Option<String>, StorageError> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        (**self).write(contents)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("settings.json"));

        assert_eq!(storage.read().unwrap(), None);
        storage.write("{\"city\":\"Oslo\"}").unwrap();
        assert_eq!(storage.read().unwrap().as_deref(), Some("{\"city\":\"Oslo\"}"));
        assert!(!storage.temp_path().exists());

        storage.clear().unwrap();
        assert_eq!(storage.read().unwrap(), None);
        storage.clear().unwrap();
    }

    #[test]
    fn test_memory_storage_failing_writes() {
        let storage = MemoryStorage::with_contents("before");
        storage.set_fail_writes(true);

        assert!(storage.write("after").is_err());
        assert!(storage.clear().is_err());
        assert_eq!(storage.contents().as_deref(), Some("before"));

        storage.set_fail_writes(false);
        storage.write("after").unwrap();
        assert_eq!(storage.contents().as_deref(), Some("after"));
    }
}
