//! Entity values and their builder.
//!
//! An [`Entity`] is an immutable value. Editing an entity means building a new
//! value (usually via [`Entity::to_builder`]) and handing it to
//! [`EntityRegistry::replace`](crate::registry::EntityRegistry::replace), which
//! keeps the surrogate id and therefore every pairing.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::fields::{Address, Email, Name, Phone, Tag};

/// Which side of a tutoring pair an entity belongs to.
///
/// Pairing is only valid across different kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Student,
    Volunteer,
}

impl EntityKind {
    /// The other kind; the only kind this one may be paired with.
    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::Student => Self::Volunteer,
            Self::Volunteer => Self::Student,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Volunteer => "volunteer",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "volunteer" => Ok(Self::Volunteer),
            _ => Err(ValidationError::UnsupportedKind {
                value: s.to_string(),
            }),
        }
    }
}

/// A student or volunteer record.
///
/// `PartialEq` is full structural equality over every field including tags
/// and kind. Whether two values describe the same real-world person is a
/// different, fuzzier question answered by
/// [`IdentityMatcher`](super::IdentityMatcher).
///
/// # Examples
///
/// ```
/// use pairbook::{Entity, EntityKind};
///
/// let alice = Entity::builder(EntityKind::Student)
///     .name("Alice Pauline")
///     .phone("94351253")
///     .tag("Math")
///     .build()
///     .unwrap();
/// assert!(alice.email().is_sentinel());
/// assert_eq!(alice.kind(), EntityKind::Student);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: Name,
    phone: Phone,
    email: Email,
    address: Address,
    tags: BTreeSet<Tag>,
    kind: EntityKind,
}

impl Entity {
    /// Starts a builder for an entity of the given kind.
    #[must_use]
    pub fn builder(kind: EntityKind) -> EntityBuilder {
        EntityBuilder::new(kind)
    }

    /// Seeds a builder with this entity's current values, for edits.
    #[must_use]
    pub fn to_builder(&self) -> EntityBuilder {
        EntityBuilder {
            kind: self.kind,
            name: Some(self.name.as_str().to_string()),
            phone: Some(self.phone.as_str().to_string()),
            email: Some(self.email.as_str().to_string()),
            address: Some(self.address.as_str().to_string()),
            tags: Some(self.tags.iter().map(|t| t.as_str().to_string()).collect()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[must_use]
    pub fn phone(&self) -> &Phone {
        &self.phone
    }

    #[must_use]
    pub fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Tags in sorted order.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns true if this entity carries a tag matching `tag` case-insensitively.
    #[must_use]
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.iter().any(|t| t.matches(tag))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}; Phone: {}; Email: {}; Address: {}; Tags: ",
            self.kind, self.name, self.phone, self.email, self.address
        )?;
        for tag in &self.tags {
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

/// Builder for [`Entity`].
///
/// Setters take raw strings; everything is validated in [`build`](Self::build).
/// Phone, email and address fall back to their sentinel values when unset.
#[derive(Debug, Clone)]
pub struct EntityBuilder {
    kind: EntityKind,
    name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    tags: Option<Vec<String>>,
}

impl EntityBuilder {
    /// Creates an empty builder for the given kind.
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            name: None,
            phone: None,
            email: None,
            address: None,
            tags: None,
        }
    }

    #[must_use]
    pub fn student() -> Self {
        Self::new(EntityKind::Student)
    }

    #[must_use]
    pub fn volunteer() -> Self {
        Self::new(EntityKind::Volunteer)
    }

    /// Changes the kind.
    #[must_use]
    pub fn kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Adds one tag to the current set.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    /// Replaces the whole tag set.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true if any field other than kind was set.
    #[must_use]
    pub fn is_any_field_set(&self) -> bool {
        self.name.is_some()
            || self.phone.is_some()
            || self.email.is_some()
            || self.address.is_some()
            || self.tags.is_some()
    }

    /// Validates every field and produces the entity.
    ///
    /// # Errors
    /// `MissingField` when no name was given, otherwise the first field
    /// validation failure in name, phone, email, address, tags order.
    pub fn build(self) -> Result<Entity, ValidationError> {
        let name = self.name.ok_or_else(|| ValidationError::missing("name"))?;
        let name = Name::parse(&name)?;

        let phone = match self.phone {
            Some(raw) => Phone::parse(&raw)?,
            None => Phone::sentinel(),
        };
        let email = match self.email {
            Some(raw) => Email::parse(&raw)?,
            None => Email::sentinel(),
        };
        let address = match self.address {
            Some(raw) => Address::parse(&raw)?,
            None => Address::sentinel(),
        };
        let tags = self
            .tags
            .unwrap_or_default()
            .iter()
            .map(|raw| Tag::parse(raw))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Entity {
            name,
            phone,
            email,
            address,
            tags,
            kind: self.kind,
        })
    }
}
