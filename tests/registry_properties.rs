//! Property tests for registry invariants under random operation sequences.

use std::collections::BTreeSet;

use pairbook::{Entity, EntityBuilder, EntityId, EntityKind, EntityRegistry, IdentityMatcher, RegistryError};
use proptest::prelude::*;

const NAMES: &[&str] = &["Alice", "alice ", "Bob", "Carl Kurz", "carl kurz", "Dana"];
const PHONES: &[Option<&str>] = &[None, Some("94351253"), Some("9435 1253"), Some("98765432")];
const EMAILS: &[Option<&str>] = &[None, Some("a@example.com"), Some("A@Example.com"), Some("b@example.com")];

#[derive(Debug, Clone)]
enum Op {
    Add { name: usize, phone: usize, email: usize, student: bool },
    Replace { slot: usize, name: usize, phone: usize, email: usize },
    Remove { slot: usize },
    Pair { a: usize, b: usize },
    Unpair { a: usize, b: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..NAMES.len(), 0..PHONES.len(), 0..EMAILS.len(), any::<bool>())
            .prop_map(|(name, phone, email, student)| Op::Add { name, phone, email, student }),
        1 => (0..8usize, 0..NAMES.len(), 0..PHONES.len(), 0..EMAILS.len())
            .prop_map(|(slot, name, phone, email)| Op::Replace { slot, name, phone, email }),
        1 => (0..8usize).prop_map(|slot| Op::Remove { slot }),
        3 => (0..8usize, 0..8usize).prop_map(|(a, b)| Op::Pair { a, b }),
        1 => (0..8usize, 0..8usize).prop_map(|(a, b)| Op::Unpair { a, b }),
    ]
}

fn build(kind: EntityKind, name: usize, phone: usize, email: usize) -> Entity {
    let mut builder = EntityBuilder::new(kind).name(NAMES[name]);
    if let Some(phone) = PHONES[phone] {
        builder = builder.phone(phone);
    }
    if let Some(email) = EMAILS[email] {
        builder = builder.email(email);
    }
    builder.build().unwrap()
}

/// Ids are picked by slot so that some ops target unknown ids.
fn slot_id(slot: usize) -> EntityId {
    EntityId::from_raw(slot as u64)
}

fn check_invariants(registry: &EntityRegistry) {
    let entries: Vec<_> = registry.all().collect();
    let mut degree_sum = 0;
    for (id, entity) in &entries {
        let partners = registry.paired_with(*id).unwrap();
        degree_sum += partners.len();
        for partner in partners {
            assert_ne!(partner, *id, "self pairing");
            let other = registry.get(partner).expect("partner registered");
            assert_ne!(other.kind(), entity.kind(), "same-kind pairing");
            assert!(registry.paired_with(partner).unwrap().contains(id), "asymmetric pairing");
            assert!(registry.is_paired(partner, *id));
        }
    }
    assert_eq!(degree_sum, registry.edge_count() * 2);

    for (i, (_, a)) in entries.iter().enumerate() {
        for (_, b) in &entries[i + 1..] {
            assert!(!IdentityMatcher::is_same(a, b), "identity duplicates {a} / {b}");
        }
    }
}

fn apply(registry: &mut EntityRegistry, op: &Op) {
    match *op {
        Op::Add { name, phone, email, student } => {
            let kind = if student { EntityKind::Student } else { EntityKind::Volunteer };
            let entity = build(kind, name, phone, email);
            let existing = registry.find_same(&entity);
            match registry.add(entity) {
                Ok(_) => assert!(existing.is_none()),
                Err(RegistryError::DuplicateEntity { existing: reported, .. }) => {
                    assert_eq!(Some(reported), existing);
                }
                Err(other) => panic!("unexpected add error {other:?}"),
            }
        }
        Op::Replace { slot, name, phone, email } => {
            let id = slot_id(slot);
            let Some(current) = registry.get(id) else {
                assert_eq!(
                    registry.replace(id, build(EntityKind::Student, name, phone, email)),
                    Err(RegistryError::NotFound(id))
                );
                return;
            };
            let edited = build(current.kind(), name, phone, email);
            let before = registry.paired_with(id).unwrap();
            let _ = registry.replace(id, edited);
            assert_eq!(registry.paired_with(id).unwrap(), before, "replace changed pairings");
        }
        Op::Remove { slot } => {
            let id = slot_id(slot);
            if registry.remove(id).is_ok() {
                for (other, _) in registry.all() {
                    assert!(!registry.paired_with(other).unwrap().contains(&id));
                }
            }
        }
        Op::Pair { a, b } => {
            let (a, b) = (slot_id(a), slot_id(b));
            let edges_before = registry.edges();
            match registry.pair(a, b) {
                Ok(()) => {
                    assert!(registry.is_paired(a, b) && registry.is_paired(b, a));
                }
                Err(err) => {
                    if a == b && registry.contains(a) {
                        assert_eq!(err, RegistryError::SelfPairing(a));
                    }
                    assert_eq!(registry.edges(), edges_before, "failed pair mutated graph");
                }
            }
        }
        Op::Unpair { a, b } => {
            let (a, b) = (slot_id(a), slot_id(b));
            let was_paired = registry.is_paired(a, b);
            let result = registry.unpair(a, b);
            assert_eq!(result.is_ok(), was_paired);
            assert!(!registry.is_paired(a, b));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// Property: every registry invariant holds after every operation.
    #[test]
    fn invariants_hold_under_random_operations(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut registry = EntityRegistry::new();
        for op in &ops {
            apply(&mut registry, op);
            check_invariants(&registry);
        }
    }

    /// Property: identity matching is symmetric and reflexive.
    #[test]
    fn identity_is_symmetric_and_reflexive(
        a in (0..NAMES.len(), 0..PHONES.len(), 0..EMAILS.len()),
        b in (0..NAMES.len(), 0..PHONES.len(), 0..EMAILS.len()),
        a_student in any::<bool>(),
    ) {
        let kind = if a_student { EntityKind::Student } else { EntityKind::Volunteer };
        let x = build(kind, a.0, a.1, a.2);
        let y = build(EntityKind::Volunteer, b.0, b.1, b.2);
        prop_assert!(IdentityMatcher::is_same(&x, &x));
        prop_assert_eq!(IdentityMatcher::is_same(&x, &y), IdentityMatcher::is_same(&y, &x));
        let x_copy = x.clone();
        prop_assert!(IdentityMatcher::is_same(&x, &x_copy));
    }

    /// Property: a snapshot round trip keeps membership and the pairing shape.
    #[test]
    fn snapshot_round_trip_preserves_pairings(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let mut registry = EntityRegistry::new();
        for op in &ops {
            apply(&mut registry, op);
        }

        let text = pairbook::storage::to_json(&registry).unwrap();
        let (decoded, report) = pairbook::storage::from_json(&text).unwrap();
        prop_assert!(report.is_clean());
        prop_assert_eq!(decoded.len(), registry.len());
        prop_assert_eq!(decoded.edge_count(), registry.edge_count());

        // Decoded ids are 0..n in the original order.
        let remap: Vec<EntityId> = registry.all().map(|(id, _)| id).collect();
        let expected: BTreeSet<(EntityId, EntityId)> = registry
            .edges()
            .into_iter()
            .map(|(a, b)| {
                let a = EntityId::from_raw(remap.iter().position(|x| *x == a).unwrap() as u64);
                let b = EntityId::from_raw(remap.iter().position(|x| *x == b).unwrap() as u64);
                (a.min(b), a.max(b))
            })
            .collect();
        prop_assert_eq!(decoded.edges().into_iter().collect::<BTreeSet<_>>(), expected);
    }
}
