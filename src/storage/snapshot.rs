//! On-disk snapshot document.
//!
//! Records are loose at the JSON level. Every field is optional, `null`
//! lists read as empty, and [`RawSnapshot`] keeps each record as an untyped
//! value until decode, so one bad record is skipped on its own. Field
//! validation happens in [`EntityRecord::to_entity`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::entity::{Entity, EntityBuilder, EntityKind, IdentityKey, Phone};
use crate::error::ValidationError;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

const fn legacy_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Top-level snapshot document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    /// Format version; documents without one are read as the current version.
    #[serde(default = "legacy_version")]
    pub version: u32,

    /// When the snapshot was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,

    /// Entity records in registry order.
    #[serde(default, alias = "persons")]
    pub entities: Vec<EntityRecord>,
}

impl SnapshotDocument {
    /// An empty document at the current version.
    #[must_use]
    pub fn new(entities: Vec<EntityRecord>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Some(Utc::now()),
            entities,
        }
    }
}

/// A snapshot as read from disk, before any record is interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSnapshot {
    #[serde(default = "legacy_version")]
    pub version: u32,

    #[serde(default, alias = "persons", deserialize_with = "null_as_empty")]
    pub entities: Vec<Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// A reference that does not parse becomes an empty one, which never resolves.
fn lenient_pairings<'de, D>(deserializer: D) -> Result<Vec<PairingRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Value> = null_as_empty(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap_or_default())
        .collect())
}

/// One persisted entity together with its outgoing pairing references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_pairings")]
    pub pairings: Vec<PairingRef>,
}

impl EntityRecord {
    /// Captures an entity and the entities it is paired with.
    #[must_use]
    pub fn from_entity<'a>(entity: &Entity, partners: impl IntoIterator<Item = &'a Entity>) -> Self {
        Self {
            name: Some(entity.name().as_str().to_string()),
            phone: Some(entity.phone().as_str().to_string()),
            email: Some(entity.email().as_str().to_string()),
            address: Some(entity.address().as_str().to_string()),
            tags: entity.tags().iter().map(|t| t.as_str().to_string()).collect(),
            kind: Some(entity.kind().as_str().to_string()),
            pairings: partners.into_iter().map(PairingRef::of).collect(),
        }
    }

    /// Re-validates the record exactly as user input would be validated.
    ///
    /// # Errors
    /// `MissingField` for an absent name, phone, email or address,
    /// `UnsupportedKind` for a missing or unknown kind, otherwise the first
    /// field validation failure.
    pub fn to_entity(&self) -> Result<Entity, ValidationError> {
        let name = self.name.as_deref().ok_or_else(|| ValidationError::missing("name"))?;
        let phone = self.phone.as_deref().ok_or_else(|| ValidationError::missing("phone"))?;
        let email = self.email.as_deref().ok_or_else(|| ValidationError::missing("email"))?;
        let address = self.address.as_deref().ok_or_else(|| ValidationError::missing("address"))?;
        let kind: EntityKind = self.kind.as_deref().unwrap_or_default().parse()?;

        EntityBuilder::new(kind)
            .name(name)
            .phone(phone)
            .email(email)
            .address(address)
            .tags(self.tags.iter().map(String::as_str))
            .build()
    }
}

/// Reference to a paired entity by its identity fields, never by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Only written when the phone is the sentinel and the email is needed to
    /// tell the partner apart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl PairingRef {
    #[must_use]
    pub fn of(partner: &Entity) -> Self {
        Self {
            name: Some(partner.name().as_str().to_string()),
            phone: Some(partner.phone().as_str().to_string()),
            email: partner
                .phone()
                .is_sentinel()
                .then(|| partner.email().as_str().to_string()),
        }
    }

    /// Identity key of the referenced entity.
    ///
    /// Returns `None` when the name or phone is missing or the phone is not a
    /// valid phone number; such a reference can never resolve. A sentinel
    /// phone without an email refers to the sentinel email.
    #[must_use]
    pub fn key(&self) -> Option<IdentityKey> {
        let name = self.name.as_deref()?;
        let phone = Phone::parse(self.phone.as_deref()?).ok()?;
        Some(IdentityKey::from_parts(
            name,
            phone.as_str(),
            self.email.as_deref().unwrap_or_default(),
        ))
    }
}
