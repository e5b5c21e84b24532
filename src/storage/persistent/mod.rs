//! File-backed snapshot storage.
//!
//! A save never leaves a half-written snapshot behind:
//!
//! ```text
//! lock (pairbook.json.lock)
//!   └─► copy pairbook.json ─► pairbook_backup.json
//!   └─► write pairbook.json.tmp.<uuid> ─► flush ─► fsync ─► rename over pairbook.json
//! ```
//!
//! A load that fails on the primary snapshot falls back to the backup copy.

mod file_lock;
mod json_file;

pub use file_lock::FileLock;
pub use json_file::JsonFileStorage;

use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Where and how the snapshot file is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Snapshot file path.
    pub data_path: PathBuf,
    /// Whether to keep a copy of the previous snapshot beside the current one.
    pub keep_backup: bool,
    /// Whether to fsync the snapshot before renaming it into place.
    pub sync_on_write: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data").join("pairbook.json"),
            keep_backup: true,
            sync_on_write: true,
        }
    }
}

impl StorageConfig {
    /// Default settings for a snapshot at `path`.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: path.into(),
            ..Self::default()
        }
    }

    /// Backup path: `<stem>_backup.<ext>` beside the snapshot.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        backup_path_for(&self.data_path)
    }

    /// Checks that the configuration can be used.
    ///
    /// # Errors
    /// `InvalidConfig` for an empty path, a path naming an existing directory,
    /// or a path whose backup path would be the path itself.
    pub fn validate(self) -> Result<Self, StorageError> {
        if self.data_path.as_os_str().is_empty() {
            return Err(invalid("data_path must not be empty"));
        }
        if self.data_path.is_dir() || self.data_path.file_name().is_none() {
            return Err(invalid(format!(
                "data_path must name a file, got directory {}",
                self.data_path.display()
            )));
        }
        if self.keep_backup && self.backup_path() == self.data_path {
            return Err(invalid(format!(
                "backup path for {} collides with the snapshot itself",
                self.data_path.display()
            )));
        }
        Ok(self)
    }
}

fn invalid(reason: impl Into<String>) -> StorageError {
    StorageError::InvalidConfig { reason: reason.into() }
}

fn backup_path_for(path: &Path) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_backup.{}", ext.to_string_lossy()),
        None => format!("{stem}_backup"),
    };
    path.with_file_name(name)
}

/// Opens file storage at `path`.
///
/// # Errors
/// `InvalidConfig` if the configuration does not validate.
///
/// # Example
/// ```rust,no_run
/// use pairbook::storage::{open_storage, RegistryStorage};
///
/// let storage = open_storage("data/pairbook.json", None)?;
/// let loaded = storage.load()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open_storage(path: impl AsRef<Path>, config: Option<StorageConfig>) -> Result<JsonFileStorage, StorageError> {
    let config = StorageConfig {
        data_path: path.as_ref().to_path_buf(),
        ..config.unwrap_or_default()
    };
    JsonFileStorage::new(config)
}
