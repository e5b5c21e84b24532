//! Sample dataset used on first start when no snapshot exists.

use crate::entity::{Entity, EntityBuilder, EntityKind};
use crate::registry::EntityRegistry;

struct SampleRow {
    kind: EntityKind,
    name: &'static str,
    phone: &'static str,
    email: &'static str,
    address: &'static str,
    tags: &'static [&'static str],
}

const SAMPLES: &[SampleRow] = &[
    SampleRow {
        kind: EntityKind::Student,
        name: "Alex Yeoh",
        phone: "87438807",
        email: "alexyeoh@example.com",
        address: "Blk 30 Geylang Street 29, #06-40",
        tags: &["Math"],
    },
    SampleRow {
        kind: EntityKind::Volunteer,
        name: "Bernice Yu",
        phone: "99272758",
        email: "berniceyu@example.com",
        address: "Blk 30 Lorong 3 Serangoon Gardens, #07-18",
        tags: &["Math", "Science"],
    },
    SampleRow {
        kind: EntityKind::Student,
        name: "Charlotte Oliveiro",
        phone: "93210283",
        email: "charlotte@example.com",
        address: "Blk 11 Ang Mo Kio Street 74, #11-04",
        tags: &["English"],
    },
    SampleRow {
        kind: EntityKind::Volunteer,
        name: "David Li",
        phone: "91031282",
        email: "lidavid@example.com",
        address: "Blk 436 Serangoon Gardens Street 26, #16-43",
        tags: &["Chinese"],
    },
    SampleRow {
        kind: EntityKind::Student,
        name: "Irfan Ibrahim",
        phone: "92492021",
        email: "irfan@example.com",
        address: "Blk 47 Tampines Street 20, #17-35",
        tags: &["Chinese"],
    },
    SampleRow {
        kind: EntityKind::Volunteer,
        name: "Roy Balakrishnan",
        phone: "92624417",
        email: "royb@example.com",
        address: "Blk 45 Aljunied Street 85, #11-31",
        tags: &["Malay", "English"],
    },
];

/// Six unpaired entities, alternating student and volunteer.
#[must_use]
pub fn sample_entities() -> Vec<Entity> {
    SAMPLES
        .iter()
        .filter_map(|row| {
            EntityBuilder::new(row.kind)
                .name(row.name)
                .phone(row.phone)
                .email(row.email)
                .address(row.address)
                .tags(row.tags.iter().copied())
                .build()
                .map_err(|err| {
                    tracing::warn!(name = row.name, error = %err, "invalid sample row");
                })
                .ok()
        })
        .collect()
}

/// A registry holding [`sample_entities`].
#[must_use]
pub fn sample_registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    for entity in sample_entities() {
        if let Err(err) = registry.add(entity) {
            tracing::warn!(error = %err, "duplicate sample row");
        }
    }
    registry
}
