//! Snapshot persistence for the registry.
//!
//! - [`codec`] converts between a registry and a [`SnapshotDocument`],
//!   rebuilding pairings by identity key on the way in.
//! - [`RegistryStorage`] is the backend contract, implemented by
//!   [`InMemoryStorage`] and [`JsonFileStorage`].
//! - [`load_or_fallback`] is the startup path: it always yields a usable
//!   registry.

pub mod codec;
mod memory;
pub mod persistent;
mod snapshot;
mod traits;

pub use codec::{decode, encode, from_json, to_json, LoadReport};
pub use memory::InMemoryStorage;
pub use persistent::{open_storage, FileLock, JsonFileStorage, StorageConfig};
pub use snapshot::{EntityRecord, PairingRef, RawSnapshot, SnapshotDocument, SNAPSHOT_VERSION};
pub use traits::RegistryStorage;

use crate::entity::Entity;
use crate::registry::EntityRegistry;

/// How [`load_or_fallback`] obtained its registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A snapshot was read (possibly from the backup; see the report).
    Loaded(LoadReport),
    /// No snapshot existed; the fallback dataset was used.
    Fallback { entities: usize },
    /// The snapshot could not be read; starting empty.
    Empty { reason: String },
}

/// Loads the registry at startup without ever failing.
///
/// A missing snapshot yields the `fallback` dataset (typically
/// [`sample_entities`](crate::sample::sample_entities) or nothing); an
/// unreadable one yields an empty registry. Both cases are logged.
pub fn load_or_fallback<S, F>(storage: &S, fallback: F) -> (EntityRegistry, LoadOutcome)
where
    S: RegistryStorage + ?Sized,
    F: FnOnce() -> Vec<Entity>,
{
    match storage.load() {
        Ok(Some((registry, report))) => (registry, LoadOutcome::Loaded(report)),
        Ok(None) => {
            let mut registry = EntityRegistry::new();
            match registry.replace_all(fallback()) {
                Ok(()) => {
                    tracing::info!(entities = registry.len(), "no snapshot; starting with fallback data");
                    let entities = registry.len();
                    (registry, LoadOutcome::Fallback { entities })
                }
                Err(err) => {
                    tracing::warn!(error = %err, "fallback data rejected; starting empty");
                    (
                        EntityRegistry::new(),
                        LoadOutcome::Empty {
                            reason: err.to_string(),
                        },
                    )
                }
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "snapshot could not be loaded; starting with an empty registry");
            (
                EntityRegistry::new(),
                LoadOutcome::Empty {
                    reason: err.to_string(),
                },
            )
        }
    }
}
