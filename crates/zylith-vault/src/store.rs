//! Persistence capability for the encrypted vault blob.
//!
//! Two variants: an in-memory store for tests and ephemeral sessions, and a
//! file store with write-new-then-rename semantics so a crash mid-save never
//! leaves a truncated vault. The encryption contract is identical for both.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::VaultError;

/// Where the sealed vault blob lives.
pub trait VaultStore: Send + Sync {
    /// Persist the blob atomically, replacing any previous one.
    ///
    /// # Errors
    /// Returns [`VaultError::Io`] when storage is unwritable.
    fn save(&self, blob: &[u8]) -> Result<(), VaultError>;

    /// Read the current blob.
    ///
    /// # Errors
    /// Returns [`VaultError::Io`] when storage is unreachable or no vault
    /// has been saved yet.
    fn load(&self) -> Result<Vec<u8>, VaultError>;
}

/// Ephemeral store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl VaultStore for MemoryStore {
    fn save(&self, blob: &[u8]) -> Result<(), VaultError> {
        let mut slot = self
            .blob
            .lock()
            .map_err(|_| VaultError::Io(std::io::Error::other("store lock poisoned")))?;
        *slot = Some(blob.to_vec());
        Ok(())
    }

    fn load(&self) -> Result<Vec<u8>, VaultError> {
        let slot = self
            .blob
            .lock()
            .map_err(|_| VaultError::Io(std::io::Error::other("store lock poisoned")))?;
        slot.clone().ok_or_else(|| {
            VaultError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no vault saved",
            ))
        })
    }
}

/// File-backed store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store the vault at `path`; parent directories are created on save.
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The vault file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VaultStore for FileStore {
    fn save(&self, blob: &[u8]) -> Result<(), VaultError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<u8>, VaultError> {
        Ok(fs::read(&self.path)?)
    }
}
