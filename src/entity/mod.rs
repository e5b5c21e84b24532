//! Entity layer modules.
//!
//! This module groups the entity value, its validated fields and the
//! identity rule used for uniqueness.

pub mod entity;
pub mod fields;
pub mod identity;

pub use entity::{Entity, EntityBuilder, EntityKind};
pub use fields::{Address, Email, Name, Phone, Tag, SENTINEL_ADDRESS, SENTINEL_EMAIL, SENTINEL_PHONE};
pub use identity::{IdentityKey, IdentityMatcher};
