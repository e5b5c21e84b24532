//! Registry <-> snapshot conversion.
//!
//! Surrogate ids never reach the snapshot. Each record lists its partners by
//! identity key, and decoding rebuilds the relation in two phases:
//!
//! ```text
//! records ──► materialize ──► key → fresh id ──► resolve references ──► pair()
//!             (validate,                          (dangling, self and
//!              dedupe)                             same-kind dropped)
//! ```
//!
//! Decoding only goes through the registry's public operations, so every
//! registry invariant is re-checked on the way in.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::snapshot::{EntityRecord, PairingRef, RawSnapshot, SnapshotDocument, SNAPSHOT_VERSION};
use crate::entity::IdentityKey;
use crate::error::{DataLoadingError, RegistryError, StorageError};
use crate::registry::{EntityId, EntityRegistry};

/// What happened while decoding a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Records admitted into the registry.
    pub loaded: usize,
    /// Records skipped because they were unreadable or a field failed validation.
    pub skipped_invalid: usize,
    /// Records skipped as identity-equivalent to an earlier record.
    pub skipped_duplicate: usize,
    /// Pairings restored.
    pub edges_linked: usize,
    /// References to entities not present after materialization.
    pub dangling_dropped: usize,
    /// References from a record to itself.
    pub self_references_dropped: usize,
    /// References between two entities of the same kind.
    pub same_kind_dropped: usize,
    /// True when the primary snapshot was unreadable and the backup was used.
    pub from_backup: bool,
}

impl LoadReport {
    /// Returns true if every record and reference was taken as is.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped_invalid == 0
            && self.skipped_duplicate == 0
            && self.dangling_dropped == 0
            && self.self_references_dropped == 0
            && self.same_kind_dropped == 0
            && !self.from_backup
    }
}

/// Captures the full registry state in insertion order.
#[must_use]
pub fn encode(registry: &EntityRegistry) -> SnapshotDocument {
    let records = registry
        .all()
        .map(|(id, entity)| {
            let partners = registry.paired_entities(id).unwrap_or_default();
            EntityRecord::from_entity(entity, partners.into_iter().map(|(_, partner)| partner))
        })
        .collect();
    SnapshotDocument::new(records)
}

/// Rebuilds a registry from a snapshot document.
///
/// Invalid and duplicate records are skipped; unresolvable or invalid
/// pairing references are dropped. Both are counted in the report.
///
/// # Errors
/// `UnsupportedVersion` if the document is newer than this build understands.
pub fn decode(document: SnapshotDocument) -> Result<(EntityRegistry, LoadReport), DataLoadingError> {
    decode_records(document.version, document.entities.into_iter().map(Ok))
}

fn decode_records<I>(version: u32, records: I) -> Result<(EntityRegistry, LoadReport), DataLoadingError>
where
    I: IntoIterator<Item = Result<EntityRecord, serde_json::Error>>,
{
    if version > SNAPSHOT_VERSION {
        return Err(DataLoadingError::UnsupportedVersion {
            found: version,
            supported: SNAPSHOT_VERSION,
        });
    }

    let mut registry = EntityRegistry::new();
    let mut report = LoadReport::default();
    let mut ids: HashMap<IdentityKey, EntityId> = HashMap::new();
    let mut pending: Vec<(EntityId, IdentityKey, Vec<PairingRef>)> = Vec::new();

    // Phase 1: materialize.
    for (position, record) in records.into_iter().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(position, error = %err, "skipping unreadable snapshot record");
                report.skipped_invalid += 1;
                continue;
            }
        };
        let entity = match record.to_entity() {
            Ok(entity) => entity,
            Err(err) => {
                tracing::warn!(position, error = %err, "skipping invalid snapshot record");
                report.skipped_invalid += 1;
                continue;
            }
        };
        let key = IdentityKey::of(&entity);
        match registry.add(entity) {
            Ok(id) => {
                ids.insert(key.clone(), id);
                pending.push((id, key, record.pairings));
                report.loaded += 1;
            }
            Err(err) => {
                tracing::warn!(position, error = %err, "skipping duplicate snapshot record");
                report.skipped_duplicate += 1;
            }
        }
    }

    // Phase 2: resolve references against the fresh ids.
    let mut seen: HashSet<(IdentityKey, IdentityKey)> = HashSet::new();
    for (owner, owner_key, references) in pending {
        for reference in references {
            let Some(target_key) = reference.key() else {
                tracing::debug!(%owner, partner = ?reference.name, "dropping unparseable pairing reference");
                report.dangling_dropped += 1;
                continue;
            };
            if target_key == owner_key {
                tracing::warn!(%owner, "dropping self pairing reference");
                report.self_references_dropped += 1;
                continue;
            }
            let Some(&target) = ids.get(&target_key) else {
                tracing::debug!(%owner, partner = %target_key, "dropping dangling pairing reference");
                report.dangling_dropped += 1;
                continue;
            };

            let edge = if owner_key < target_key {
                (owner_key.clone(), target_key)
            } else {
                (target_key, owner_key.clone())
            };
            if !seen.insert(edge) {
                continue;
            }

            match registry.pair(owner, target) {
                Ok(()) => report.edges_linked += 1,
                Err(RegistryError::SameKind { kind, .. }) => {
                    tracing::warn!(%owner, %target, %kind, "dropping same-kind pairing from snapshot");
                    report.same_kind_dropped += 1;
                }
                Err(err) => {
                    tracing::warn!(%owner, %target, error = %err, "dropping unusable pairing reference");
                    report.dangling_dropped += 1;
                }
            }
        }
    }

    tracing::info!(
        loaded = report.loaded,
        edges = report.edges_linked,
        skipped = report.skipped_invalid + report.skipped_duplicate,
        "snapshot decoded"
    );
    Ok((registry, report))
}

/// Serializes the registry as pretty-printed JSON.
///
/// # Errors
/// `Serialization` if the document cannot be rendered.
pub fn to_json(registry: &EntityRegistry) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(&encode(registry))?)
}

/// Parses and decodes a JSON snapshot.
///
/// Each record is read on its own, so a record with a wrongly typed field is
/// skipped and counted rather than failing the document.
///
/// # Errors
/// `Malformed` if the text is not a snapshot document, `UnsupportedVersion`
/// if it is too new.
pub fn from_json(text: &str) -> Result<(EntityRegistry, LoadReport), DataLoadingError> {
    let raw: RawSnapshot = serde_json::from_str(text).map_err(|source| DataLoadingError::Malformed { source })?;
    decode_records(raw.version, raw.entities.into_iter().map(serde_json::from_value::<EntityRecord>))
}
