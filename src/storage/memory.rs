//! In-memory storage backend.
//!
//! Keeps the last saved snapshot as JSON text. Intended for embedded usage and
//! tests; it goes through the same codec as the file backend, so a round trip
//! here behaves exactly like a save/restart/load cycle.

use std::sync::{PoisonError, RwLock};

use crate::error::{DataLoadingError, StorageError};
use crate::registry::EntityRegistry;

use super::codec::{from_json, to_json, LoadReport};
use super::traits::RegistryStorage;

#[derive(Debug, Default)]
pub struct InMemoryStorage {
    snapshot: RwLock<Option<String>>,
}

impl InMemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a pre-existing snapshot text, e.g. a hand-written fixture.
    #[must_use]
    pub fn with_snapshot(text: impl Into<String>) -> Self {
        Self {
            snapshot: RwLock::new(Some(text.into())),
        }
    }

    /// The last saved snapshot text, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<String> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl RegistryStorage for InMemoryStorage {
    fn load(&self) -> Result<Option<(EntityRegistry, LoadReport)>, DataLoadingError> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_deref().map(from_json).transpose()
    }

    fn save(&self, registry: &EntityRegistry) -> Result<(), StorageError> {
        let text = to_json(registry)?;
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(text);
        tracing::debug!(entities = registry.len(), "snapshot saved in memory");
        Ok(())
    }
}
