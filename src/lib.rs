//! # pairbook - student/volunteer registry with pairing
//!
//! pairbook keeps a registry of students and volunteers and the tutoring
//! pairings between them. Entities are immutable values that are replaced
//! wholesale on every edit, yet pairings survive those edits because they are
//! keyed by a surrogate [`EntityId`] issued once at admission.
//!
//! ## Core Concepts
//!
//! - **Entity**: an immutable record (name, phone, email, address, tags, kind)
//! - **IdentityMatcher**: the fuzzy "same person" rule behind uniqueness
//! - **EntityRegistry**: CRUD and pairing keyed by id, with a symmetric
//!   relation that only ever pairs a student with a volunteer
//! - **Snapshot**: a JSON document that references partners by identity key,
//!   decoded in two phases so pairings are rebuilt against fresh ids
//!
//! ## Usage
//!
//! ```rust
//! use pairbook::storage::{InMemoryStorage, RegistryStorage};
//! use pairbook::{EntityBuilder, EntityRegistry};
//!
//! let mut registry = EntityRegistry::new();
//! let alice = registry.add(EntityBuilder::student().name("Alice").phone("94351253").build()?)?;
//! let bob = registry.add(EntityBuilder::volunteer().name("Bob").phone("98765432").build()?)?;
//! registry.pair(alice, bob)?;
//!
//! let storage = InMemoryStorage::new();
//! storage.save(&registry)?;
//! let (reloaded, report) = storage.load()?.expect("just saved");
//! assert_eq!(reloaded.edge_count(), 1);
//! assert!(report.is_clean());
//! # Ok::<(), pairbook::PairbookError>(())
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod entity;
pub mod error;
pub mod registry;
pub mod sample;
pub mod storage;
pub mod telemetry;

// Re-export primary types at crate root for convenience
pub use entity::{Entity, EntityBuilder, EntityKind, IdentityKey, IdentityMatcher};
pub use error::{DataLoadingError, PairbookError, PairbookResult, RegistryError, StorageError, ValidationError};
pub use registry::{EntityId, EntityRegistry, RegistryEvent, RegistryWatch};
pub use storage::{load_or_fallback, LoadOutcome, LoadReport, RegistryStorage};
