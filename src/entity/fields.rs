//! Validated field values.
//!
//! Every field of an [`Entity`](super::Entity) is a newtype that can only be
//! built through `parse`, so an entity value always carries well-formed data.
//! The same `parse` functions run when a snapshot is decoded; a snapshot is
//! never trusted to be clean.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ValidationError;

const NAME_PATTERN: &str = r"^[\p{L}\p{M}\p{N}][\p{L}\p{M}\p{N} .,'’\-/()]*$";
const PHONE_PATTERN: &str = r"^\+?\d(?:[ -]?\d){2,}$";
const EMAIL_PATTERN: &str = concat!(
    r"^[A-Za-z0-9]+(?:[+_.\-][A-Za-z0-9]+)*",
    r"@(?:[A-Za-z0-9]+(?:-[A-Za-z0-9]+)*\.)*[A-Za-z0-9]{2,}(?:-[A-Za-z0-9]+)*$",
);
const TAG_PATTERN: &str = r"^[A-Za-z0-9]+$";

/// Canonical phone value meaning "no phone supplied".
pub const SENTINEL_PHONE: &str = "000";
/// Email value meaning "no email supplied".
pub const SENTINEL_EMAIL: &str = "default@email";
/// Address value meaning "no address supplied".
pub const SENTINEL_ADDRESS: &str = "Default Address";

fn compiled(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    // Patterns are compile-time constants covered by the tests below.
    cell.get_or_init(|| Regex::new(pattern).expect("built-in field pattern compiles"))
}

fn name_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, NAME_PATTERN)
}

fn phone_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, PHONE_PATTERN)
}

fn email_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, EMAIL_PATTERN)
}

fn tag_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, TAG_PATTERN)
}

/// A person's display name, stored exactly as entered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    /// Validates and wraps a name.
    ///
    /// # Errors
    /// `InvalidName` if the first character is not a letter, mark or digit, or
    /// any later character is outside the allowed punctuation set.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if name_regex().is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidName {
                value: raw.to_string(),
            })
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trimmed, lowercased form used by identity matching and name lookups.
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize_name(&self.0)
    }
}

pub(crate) fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A phone number in canonical form: spaces and dashes removed, a leading
/// `+` preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Validates and canonicalizes a phone number.
    ///
    /// # Errors
    /// `InvalidPhone` unless the trimmed input is an optional `+` followed by
    /// at least three digits, optionally separated by single spaces or dashes.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if !phone_regex().is_match(trimmed) {
            return Err(ValidationError::InvalidPhone {
                value: raw.to_string(),
            });
        }
        Ok(Self(trimmed.chars().filter(|c| *c != ' ' && *c != '-').collect()))
    }

    /// The "unset" phone.
    #[must_use]
    pub fn sentinel() -> Self {
        Self(SENTINEL_PHONE.to_string())
    }

    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.0 == SENTINEL_PHONE
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An email address, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Validates an email address.
    ///
    /// # Errors
    /// `InvalidEmail` if the trimmed value is not `local-part@domain`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if email_regex().is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ValidationError::InvalidEmail {
                value: raw.to_string(),
            })
        }
    }

    /// The "unset" email.
    #[must_use]
    pub fn sentinel() -> Self {
        Self(SENTINEL_EMAIL.to_string())
    }

    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.0.eq_ignore_ascii_case(SENTINEL_EMAIL)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used by identity matching.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A postal address. Any non-blank text is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// # Errors
    /// `BlankAddress` if the value is empty or starts with whitespace.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.chars().next() {
            Some(c) if !c.is_whitespace() => Ok(Self(raw.to_string())),
            _ => Err(ValidationError::BlankAddress),
        }
    }

    /// The "unset" address.
    #[must_use]
    pub fn sentinel() -> Self {
        Self(SENTINEL_ADDRESS.to_string())
    }

    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.0 == SENTINEL_ADDRESS
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A free-text label such as a subject ("Math").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// # Errors
    /// `InvalidTag` unless the value is non-empty ASCII alphanumeric.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if tag_regex().is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidTag {
                value: raw.to_string(),
            })
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison used by tag search.
    #[must_use]
    pub fn matches(&self, other: &Tag) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}
