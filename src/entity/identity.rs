//! Identity matching.
//!
//! Two entity values are "the same person" when their names agree after
//! trimming and case folding, and their contact details agree on a real
//! (non-sentinel) phone or email, or both are entirely contactless. Tags,
//! address and kind never participate.

use std::fmt;

use super::entity::Entity;
use super::fields::{normalize_name, SENTINEL_EMAIL, SENTINEL_PHONE};

/// Stateless identity-equivalence test.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMatcher;

impl IdentityMatcher {
    /// Returns true if `a` and `b` denote the same real-world person.
    ///
    /// Pure, symmetric and reflexive.
    #[must_use]
    pub fn is_same(a: &Entity, b: &Entity) -> bool {
        if std::ptr::eq(a, b) {
            return true;
        }
        if a.name().normalized() != b.name().normalized() {
            return false;
        }

        let a_real_phone = !a.phone().is_sentinel();
        let b_real_phone = !b.phone().is_sentinel();
        let a_real_email = !a.email().is_sentinel();
        let b_real_email = !b.email().is_sentinel();

        let same_phone = a_real_phone && b_real_phone && a.phone() == b.phone();
        let same_email = a_real_email && b_real_email && a.email().normalized() == b.email().normalized();
        let both_contactless = !a_real_phone && !b_real_phone && !a_real_email && !b_real_email;

        same_phone || same_email || both_contactless
    }
}

/// Stable lookup key for an entity across a save/load cycle.
///
/// The key is the normalized name plus the canonical phone; when the phone is
/// the sentinel the lowercased email takes its place. Within a registry the
/// key is unique: two entities sharing a key would be identity-equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityKey {
    Phone { name: String, phone: String },
    Email { name: String, email: String },
}

impl IdentityKey {
    /// Derives the key of a validated entity.
    #[must_use]
    pub fn of(entity: &Entity) -> Self {
        let name = entity.name().normalized();
        if entity.phone().is_sentinel() {
            Self::Email {
                name,
                email: entity.email().normalized(),
            }
        } else {
            Self::Phone {
                name,
                phone: entity.phone().as_str().to_string(),
            }
        }
    }

    /// Derives a key from already-canonical raw parts, as found in a pairing
    /// reference. `phone` must be in canonical form. A blank email stands for
    /// the sentinel email.
    #[must_use]
    pub fn from_parts(name: &str, phone: &str, email: &str) -> Self {
        let name = normalize_name(name);
        if phone == SENTINEL_PHONE {
            let email = match email.trim() {
                "" => SENTINEL_EMAIL,
                trimmed => trimmed,
            };
            Self::Email {
                name,
                email: email.to_lowercase(),
            }
        } else {
            Self::Phone {
                name,
                phone: phone.to_string(),
            }
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phone { name, phone } => write!(f, "{name}|{phone}"),
            Self::Email { name, email } => write!(f, "{name}|@{email}"),
        }
    }
}
