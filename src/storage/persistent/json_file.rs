//! JSON snapshot file with backup and atomic replace.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Result as IoResult, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::file_lock::FileLock;
use super::StorageConfig;
use crate::error::{DataLoadingError, StorageError};
use crate::registry::EntityRegistry;
use crate::storage::codec::{from_json, to_json, LoadReport};
use crate::storage::traits::RegistryStorage;

/// Snapshot storage in a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    config: StorageConfig,
}

impl JsonFileStorage {
    /// # Errors
    /// `InvalidConfig` if `config` does not validate.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        Ok(Self {
            config: config.validate()?,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.data_path
    }

    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        self.config.backup_path()
    }

    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn read_snapshot(path: &Path) -> Result<(EntityRegistry, LoadReport), DataLoadingError> {
        let text = fs::read_to_string(path).map_err(|source| DataLoadingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        from_json(&text)
    }

    fn refresh_backup(&self) {
        if !self.config.keep_backup {
            return;
        }
        let backup = self.backup_path();
        if let Err(err) = fs::copy(self.path(), &backup) {
            tracing::warn!(backup = %backup.display(), error = %err, "could not refresh snapshot backup");
        }
    }
}

impl RegistryStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<(EntityRegistry, LoadReport)>, DataLoadingError> {
        let path = self.path();
        if !path.exists() {
            tracing::info!(path = %path.display(), "no snapshot found");
            return Ok(None);
        }

        match Self::read_snapshot(path) {
            Ok(loaded) => {
                self.refresh_backup();
                tracing::info!(path = %path.display(), entities = loaded.0.len(), "snapshot loaded");
                Ok(Some(loaded))
            }
            Err(primary) => {
                let backup = self.backup_path();
                tracing::warn!(path = %path.display(), error = %primary, "snapshot unreadable, trying backup");
                if !self.config.keep_backup || !backup.exists() {
                    return Err(primary);
                }
                match Self::read_snapshot(&backup) {
                    Ok((registry, mut report)) => {
                        report.from_backup = true;
                        tracing::warn!(backup = %backup.display(), entities = registry.len(), "loaded snapshot from backup");
                        Ok(Some((registry, report)))
                    }
                    Err(err) => {
                        tracing::warn!(backup = %backup.display(), error = %err, "backup unreadable too");
                        Err(primary)
                    }
                }
            }
        }
    }

    fn save(&self, registry: &EntityRegistry) -> Result<(), StorageError> {
        let path = self.path();
        let io_err = |source: std::io::Error| StorageError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let _lock = FileLock::acquire(path).map_err(|err| {
            if err.kind() == ErrorKind::WouldBlock {
                StorageError::Locked {
                    path: path.to_path_buf(),
                }
            } else {
                io_err(err)
            }
        })?;

        if self.config.keep_backup && path.exists() {
            fs::copy(path, self.backup_path()).map_err(io_err)?;
        }

        let text = to_json(registry)?;
        let mut writer = SnapshotWriter::new(path.to_path_buf()).map_err(io_err)?;
        writer.write(text.as_bytes()).map_err(io_err)?;
        writer.finalize(self.config.sync_on_write).map_err(io_err)?;

        tracing::info!(path = %path.display(), entities = registry.len(), edges = registry.edge_count(), "snapshot saved");
        Ok(())
    }
}

/// Writes to a temporary sibling file and renames it over the target on
/// [`finalize`](Self::finalize). Dropping an unfinished writer removes the
/// temporary file.
struct SnapshotWriter {
    temp_path: Option<PathBuf>,
    final_path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl SnapshotWriter {
    fn new(final_path: PathBuf) -> IoResult<Self> {
        let ext = final_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = final_path.with_extension(format!("{ext}.tmp.{}", Uuid::new_v4()));

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        Ok(Self {
            temp_path: Some(temp_path),
            final_path,
            writer: Some(BufWriter::new(file)),
        })
    }

    fn write(&mut self, bytes: &[u8]) -> IoResult<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| std::io::Error::new(ErrorKind::Other, "writer already consumed"))?;
        writer.write_all(bytes)?;
        writer.write_all(b"\n")
    }

    fn finalize(mut self, sync: bool) -> IoResult<()> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| std::io::Error::new(ErrorKind::Other, "writer already consumed"))?;
        writer.flush()?;
        if sync {
            writer.get_ref().sync_all()?;
        }
        drop(writer);

        let temp_path = self
            .temp_path
            .take()
            .ok_or_else(|| std::io::Error::new(ErrorKind::Other, "temp_path already consumed"))?;
        if let Err(err) = fs::rename(&temp_path, &self.final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }
        Ok(())
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        self.writer.take();
        if let Some(temp) = self.temp_path.take() {
            let _ = fs::remove_file(temp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityBuilder;
    use tempfile::tempdir;

    fn paired_registry() -> EntityRegistry {
        let mut registry = EntityRegistry::new();
        let a = registry.add(EntityBuilder::student().name("Alice").phone("94351253").build().unwrap()).unwrap();
        let b = registry.add(EntityBuilder::volunteer().name("Bob").phone("98765432").build().unwrap()).unwrap();
        registry.pair(a, b).unwrap();
        registry
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::new(StorageConfig::with_path(dir.path().join("book.json"))).unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("book.json");
        let storage = JsonFileStorage::new(StorageConfig::with_path(&path)).unwrap();

        storage.save(&paired_registry()).unwrap();
        assert!(path.exists());

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_second_save_writes_backup() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::new(StorageConfig::with_path(dir.path().join("book.json"))).unwrap();

        storage.save(&paired_registry()).unwrap();
        assert!(!storage.backup_path().exists());
        storage.save(&EntityRegistry::new()).unwrap();
        assert!(storage.backup_path().exists());

        let (backup, _) = JsonFileStorage::read_snapshot(&storage.backup_path()).unwrap();
        assert_eq!(backup.len(), 2);
        let (current, _) = storage.load().unwrap().unwrap();
        assert!(current.is_empty());
    }

    #[test]
    fn test_corrupt_primary_falls_back_to_backup() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::new(StorageConfig::with_path(dir.path().join("book.json"))).unwrap();
        storage.save(&paired_registry()).unwrap();
        // a successful load refreshes the backup
        storage.load().unwrap().unwrap();

        fs::write(storage.path(), "{ not json").unwrap();
        let (registry, report) = storage.load().unwrap().unwrap();
        assert!(report.from_backup);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.edge_count(), 1);
    }

    #[test]
    fn test_corrupt_without_backup_is_error() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::new(StorageConfig::with_path(dir.path().join("book.json"))).unwrap();
        fs::write(storage.path(), "garbage").unwrap();
        assert!(matches!(storage.load(), Err(DataLoadingError::Malformed { .. })));
    }

    #[test]
    fn test_save_while_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.json");
        let storage = JsonFileStorage::new(StorageConfig::with_path(&path)).unwrap();

        let _held = FileLock::acquire(&path).unwrap();
        assert!(matches!(storage.save(&paired_registry()), Err(StorageError::Locked { .. })));
    }

    #[test]
    fn test_unfinished_writer_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.json");
        {
            let mut writer = SnapshotWriter::new(path.clone()).unwrap();
            writer.write(b"{}").unwrap();
        }
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
