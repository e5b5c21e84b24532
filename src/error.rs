//! Error types for pairbook.
//!
//! All errors are strongly typed using thiserror so callers (the command
//! layer, the startup path) can pattern match on the exact failure and turn
//! it into a user-facing message.

use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityKind;
use crate::registry::EntityId;

/// Field validation errors raised while constructing an entity, either from
/// user input or from a snapshot record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(
        "Invalid name '{value}': names must start with a letter or digit and may contain \
         letters, digits, spaces and . , ' ’ - / ( )"
    )]
    InvalidName {
        value: String,
    },

    #[error(
        "Invalid phone '{value}': phone numbers must have at least 3 digits, may start with '+', \
         and may include spaces or dashes"
    )]
    InvalidPhone {
        value: String,
    },

    #[error("Invalid email '{value}': expected local-part@domain")]
    InvalidEmail {
        value: String,
    },

    #[error("Address cannot be blank")]
    BlankAddress,

    #[error("Invalid tag '{value}': tags must be alphanumeric")]
    InvalidTag {
        value: String,
    },

    #[error("Unsupported or missing entry kind '{value}' (expected 'student' or 'volunteer')")]
    UnsupportedKind {
        value: String,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },
}

impl ValidationError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }
}

/// Errors raised by [`EntityRegistry`](crate::registry::EntityRegistry) mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("'{name}' is already registered as {existing}")]
    DuplicateEntity {
        name: String,
        existing: EntityId,
    },

    #[error("Entries {first} and {second} both describe '{name}'")]
    DuplicateInBatch {
        first: usize,
        second: usize,
        name: String,
    },

    #[error("Entity not found: {0}")]
    NotFound(EntityId),

    #[error("{0} cannot be paired with itself")]
    SelfPairing(EntityId),

    #[error("{first} and {second} are both {kind}s; {kind}s cannot be paired with {kind}s")]
    SameKind {
        first: EntityId,
        second: EntityId,
        kind: EntityKind,
    },

    #[error("{first} and {second} are already paired")]
    AlreadyPaired {
        first: EntityId,
        second: EntityId,
    },

    #[error("{first} and {second} are not paired")]
    NotPaired {
        first: EntityId,
        second: EntityId,
    },

    #[error("Pairing {owner} was rejected for {} target(s)", failures.len())]
    PairingRejected {
        owner: EntityId,
        failures: Vec<(EntityId, RegistryError)>,
    },
}

impl RegistryError {
    /// Returns true for both single-entity and batch identity collisions.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateEntity { .. } | Self::DuplicateInBatch { .. })
    }

    /// Returns true if the error describes a pairing invariant violation.
    #[must_use]
    pub const fn is_pairing(&self) -> bool {
        matches!(
            self,
            Self::SelfPairing(_)
                | Self::SameKind { .. }
                | Self::AlreadyPaired { .. }
                | Self::NotPaired { .. }
                | Self::PairingRejected { .. }
        )
    }
}

/// The persisted snapshot could not be read at all.
///
/// Per-record problems never produce this error; they are counted in the
/// [`LoadReport`](crate::storage::LoadReport) instead.
#[derive(Debug, Error)]
pub enum DataLoadingError {
    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot is not a valid document: {source}")]
    Malformed {
        #[source]
        source: serde_json::Error,
    },

    #[error("Snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        found: u32,
        supported: u32,
    },
}

/// Save-side storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot at {path} is locked by another process")]
    Locked {
        path: PathBuf,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid storage configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Top-level error type for pairbook.
#[derive(Debug, Error)]
pub enum PairbookError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Data loading error: {0}")]
    DataLoading(#[from] DataLoadingError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PairbookError {
    /// Returns true if this is a field validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a registry error.
    #[must_use]
    pub const fn is_registry(&self) -> bool {
        matches!(self, Self::Registry(_))
    }

    /// Returns true if the snapshot could not be loaded.
    #[must_use]
    pub const fn is_data_loading(&self) -> bool {
        matches!(self, Self::DataLoading(_))
    }

    /// Returns true if this is a save-side storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result type alias for pairbook operations.
pub type PairbookResult<T> = Result<T, PairbookError>;
