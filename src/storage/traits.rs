//! Storage contract for registry snapshots.
//!
//! A backend persists the whole registry at once. It never sees surrogate ids;
//! everything goes through [`encode`](super::encode) and
//! [`decode`](super::decode).

use crate::error::{DataLoadingError, StorageError};
use crate::registry::EntityRegistry;

use super::codec::LoadReport;

/// Snapshot storage for an [`EntityRegistry`].
pub trait RegistryStorage: Send + Sync {
    /// Loads the last saved registry.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    /// `DataLoadingError` if a snapshot exists but cannot be read or parsed.
    fn load(&self) -> Result<Option<(EntityRegistry, LoadReport)>, DataLoadingError>;

    /// Persists the full registry state, replacing the previous snapshot.
    ///
    /// # Errors
    /// `StorageError` if the snapshot could not be written.
    fn save(&self, registry: &EntityRegistry) -> Result<(), StorageError>;
}
