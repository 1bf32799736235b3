//! Durable storage for the fallback device identifier.

use std::path::PathBuf;

use thiserror::Error;

/// Key (file name) holding the fallback identifier.
pub const DEVICE_ID_KEY: &str = "device_id";

/// Errors that can occur reading or writing the stored identifier.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Durable key-value slot for the fallback identifier.
#[cfg_attr(test, mockall::automock)]
pub trait IdStore: Send + Sync {
    /// Read the stored identifier, if any.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Persist the identifier, replacing any previous value.
    fn save(&self, id: &str) -> Result<(), StorageError>;
}

/// Stores the identifier in a single file under a data directory.
pub struct FileIdStore {
    data_dir: PathBuf,
}

impl FileIdStore {
    /// Create a store under the platform's local data directory.
    pub fn new() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("voicestore-rs");

        Self { data_dir }
    }

    /// Create a store under a custom directory.
    pub fn with_dir(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    fn path(&self) -> PathBuf {
        self.data_dir.join(DEVICE_ID_KEY)
    }
}

impl Default for FileIdStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdStore for FileIdStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let path = self.path();

        if !path.exists() {
            return Ok(None);
        }

        let id = std::fs::read_to_string(path)?;
        let id = id.trim();

        Ok((!id.is_empty()).then(|| id.to_string()))
    }

    fn save(&self, id: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::write(self.path(), id)?;

        Ok(())
    }
}
