//! The entity registry.
//!
//! [`EntityRegistry`] owns every admitted entity under a surrogate
//! [`EntityId`] and the pairing relation between them. Entities are immutable
//! values; the id is the only handle that survives an edit, so every pairing
//! is keyed by id.
//!
//! # Invariants
//! - No two ids map to identity-equivalent entities.
//! - Every id in the pairing relation is registered.
//! - No self pairings and no same-kind pairings.
//! - `a ~ b` holds exactly when `b ~ a` holds.
//!
//! All mutators take `&mut self`. The registry is not synchronized; a caller
//! sharing it across threads must serialize access itself.

mod events;
mod graph;
mod query;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKind, IdentityMatcher};
use crate::error::RegistryError;

pub use events::{RegistryEvent, RegistryWatch};

use events::Publisher;
use graph::RelationGraph;

/// Surrogate id issued by the registry when an entity is admitted.
///
/// Ids increase monotonically and are not reused after removal, except that
/// [`EntityRegistry::replace_all`] starts a fresh numbering from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Wraps a raw id. Only meaningful for ids previously issued by a registry.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Authoritative store of entities and their pairings.
///
/// # Examples
///
/// ```
/// use pairbook::{EntityBuilder, EntityRegistry};
///
/// let mut registry = EntityRegistry::new();
/// let alice = registry
///     .add(EntityBuilder::student().name("Alice").phone("94351253").build().unwrap())
///     .unwrap();
/// let bob = registry
///     .add(EntityBuilder::volunteer().name("Bob").phone("98765432").build().unwrap())
///     .unwrap();
/// registry.pair(alice, bob).unwrap();
/// assert!(registry.is_paired(bob, alice));
/// ```
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<EntityId, Entity>,
    by_name: HashMap<String, BTreeSet<EntityId>>,
    graph: RelationGraph,
    next_id: u64,
    publisher: Publisher,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a new entity and returns its id.
    ///
    /// # Errors
    /// `DuplicateEntity` if an identity-equivalent entity is already registered.
    pub fn add(&mut self, entity: Entity) -> Result<EntityId, RegistryError> {
        if let Some(existing) = self.find_same_except(&entity, None) {
            return Err(RegistryError::DuplicateEntity {
                name: entity.name().to_string(),
                existing,
            });
        }

        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.index_name(id, entity.name().normalized());
        tracing::debug!(%id, name = %entity.name(), kind = %entity.kind(), "entity added");
        self.entities.insert(id, entity);
        self.publisher.publish(&RegistryEvent::Added { id });
        Ok(id)
    }

    /// Rebinds `id` to an edited value, returning the previous value.
    ///
    /// Pairings are keyed by id and are untouched.
    ///
    /// # Errors
    /// - `NotFound` if `id` is not registered.
    /// - `DuplicateEntity` if `entity` is identity-equivalent to another id.
    /// - `SameKind` if the edit changes the kind of a paired entity, which
    ///   would turn its pairings into same-kind pairings.
    pub fn replace(&mut self, id: EntityId, entity: Entity) -> Result<Entity, RegistryError> {
        let current_kind = self.entities.get(&id).ok_or(RegistryError::NotFound(id))?.kind();

        if let Some(existing) = self.find_same_except(&entity, Some(id)) {
            return Err(RegistryError::DuplicateEntity {
                name: entity.name().to_string(),
                existing,
            });
        }

        if entity.kind() != current_kind {
            if let Some(partner) = self.graph.neighbors(id).next() {
                return Err(RegistryError::SameKind {
                    first: id,
                    second: partner,
                    kind: entity.kind(),
                });
            }
        }

        let key = entity.name().normalized();
        let previous = self
            .entities
            .insert(id, entity)
            .ok_or(RegistryError::NotFound(id))?;
        self.unindex_name(id, &previous);
        self.index_name(id, key);
        tracing::debug!(%id, "entity replaced");
        self.publisher.publish(&RegistryEvent::Replaced { id });
        Ok(previous)
    }

    /// Removes `id`, dropping every pairing it took part in.
    ///
    /// # Errors
    /// `NotFound` if `id` is not registered.
    pub fn remove(&mut self, id: EntityId) -> Result<Entity, RegistryError> {
        let removed = self.entities.remove(&id).ok_or(RegistryError::NotFound(id))?;
        self.unindex_name(id, &removed);
        let former_partners = self.graph.remove_vertex(id);
        tracing::debug!(%id, unpaired = former_partners.len(), "entity removed");
        self.publisher.publish(&RegistryEvent::Removed { id, former_partners });
        Ok(removed)
    }

    /// Pairs `first` with `second`.
    ///
    /// # Errors
    /// `NotFound`, `SelfPairing`, `SameKind` or `AlreadyPaired`, checked in
    /// that order. The relation is unchanged on error.
    pub fn pair(&mut self, first: EntityId, second: EntityId) -> Result<(), RegistryError> {
        self.check_pairable(first, second)?;
        self.graph.insert(first, second);
        tracing::debug!(%first, %second, "paired");
        self.publisher.publish(&RegistryEvent::Paired { first, second });
        Ok(())
    }

    /// Pairs `owner` with every target, all or nothing.
    ///
    /// Repeated targets are ignored. Returns the targets paired, in the order
    /// first given.
    ///
    /// # Errors
    /// `NotFound` if `owner` is unknown; otherwise `PairingRejected` listing
    /// every target that could not be paired and why. Nothing is paired when
    /// any target fails.
    pub fn pair_many(&mut self, owner: EntityId, targets: &[EntityId]) -> Result<Vec<EntityId>, RegistryError> {
        if !self.entities.contains_key(&owner) {
            return Err(RegistryError::NotFound(owner));
        }

        let mut seen = BTreeSet::new();
        let unique: Vec<EntityId> = targets.iter().copied().filter(|t| seen.insert(*t)).collect();

        let failures: Vec<(EntityId, RegistryError)> = unique
            .iter()
            .filter_map(|target| self.check_pairable(owner, *target).err().map(|e| (*target, e)))
            .collect();
        if !failures.is_empty() {
            return Err(RegistryError::PairingRejected { owner, failures });
        }

        for target in &unique {
            self.graph.insert(owner, *target);
            self.publisher.publish(&RegistryEvent::Paired {
                first: owner,
                second: *target,
            });
        }
        tracing::debug!(%owner, count = unique.len(), "paired batch");
        Ok(unique)
    }

    /// Removes the pairing between `first` and `second`.
    ///
    /// # Errors
    /// `NotFound` if either id is unknown, `NotPaired` if they are not paired.
    pub fn unpair(&mut self, first: EntityId, second: EntityId) -> Result<(), RegistryError> {
        self.require(first)?;
        self.require(second)?;
        if !self.graph.remove(first, second) {
            return Err(RegistryError::NotPaired { first, second });
        }
        tracing::debug!(%first, %second, "unpaired");
        self.publisher.publish(&RegistryEvent::Unpaired { first, second });
        Ok(())
    }

    /// Returns true if `first ~ second`. Unknown ids are never paired.
    #[must_use]
    pub fn is_paired(&self, first: EntityId, second: EntityId) -> bool {
        self.graph.contains(first, second)
    }

    /// Ids paired with `id`.
    ///
    /// # Errors
    /// `NotFound` if `id` is not registered.
    pub fn paired_with(&self, id: EntityId) -> Result<BTreeSet<EntityId>, RegistryError> {
        self.require(id)?;
        Ok(self.graph.neighbors(id).collect())
    }

    /// Partners of `id` with their current values, ordered by id.
    ///
    /// # Errors
    /// `NotFound` if `id` is not registered.
    pub fn paired_entities(&self, id: EntityId) -> Result<Vec<(EntityId, &Entity)>, RegistryError> {
        Ok(self
            .paired_with(id)?
            .into_iter()
            .filter_map(|partner| self.entities.get(&partner).map(|e| (partner, e)))
            .collect())
    }

    /// Every entity in insertion order.
    ///
    /// Edits keep an entity's position. Each call starts a fresh iteration.
    pub fn all(&self) -> impl Iterator<Item = (EntityId, &Entity)> + Clone + '_ {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    /// Entities of one kind, in insertion order.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.all().filter(move |(_, e)| e.kind() == kind)
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Id of the registered entity identity-equivalent to `entity`, if any.
    #[must_use]
    pub fn find_same(&self, entity: &Entity) -> Option<EntityId> {
        self.find_same_except(entity, None)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of pairings.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every pairing once as `(smaller id, larger id)`, sorted.
    #[must_use]
    pub fn edges(&self) -> Vec<(EntityId, EntityId)> {
        self.graph.edges()
    }

    /// Replaces the whole content with `entities`, numbered 0..n in order.
    ///
    /// All pairings are cleared.
    ///
    /// # Errors
    /// `DuplicateInBatch` naming the first identity-equivalent pair of
    /// positions; the registry is unchanged in that case.
    pub fn replace_all(&mut self, entities: Vec<Entity>) -> Result<(), RegistryError> {
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, entity) in entities.iter().enumerate() {
            let group = groups.entry(entity.name().normalized()).or_default();
            if let Some(first) = group
                .iter()
                .copied()
                .find(|earlier| IdentityMatcher::is_same(&entities[*earlier], entity))
            {
                return Err(RegistryError::DuplicateInBatch {
                    first,
                    second: pos,
                    name: entity.name().to_string(),
                });
            }
            group.push(pos);
        }

        self.entities.clear();
        self.by_name.clear();
        self.graph.clear();
        self.next_id = 0;

        let count = entities.len();
        for entity in entities {
            let id = EntityId(self.next_id);
            self.next_id += 1;
            self.index_name(id, entity.name().normalized());
            self.entities.insert(id, entity);
        }
        tracing::debug!(count, "registry reset");
        self.publisher.publish(&RegistryEvent::Reset { count });
        Ok(())
    }

    /// Subscribes to change events. Events beyond `capacity` unread ones are
    /// dropped for this watcher.
    pub fn subscribe(&mut self, capacity: usize) -> RegistryWatch {
        self.publisher.subscribe(capacity)
    }

    fn require(&self, id: EntityId) -> Result<&Entity, RegistryError> {
        self.entities.get(&id).ok_or(RegistryError::NotFound(id))
    }

    fn check_pairable(&self, first: EntityId, second: EntityId) -> Result<(), RegistryError> {
        let a = self.require(first)?;
        let b = self.require(second)?;
        if first == second {
            return Err(RegistryError::SelfPairing(first));
        }
        if a.kind() == b.kind() {
            return Err(RegistryError::SameKind {
                first,
                second,
                kind: a.kind(),
            });
        }
        if self.graph.contains(first, second) {
            return Err(RegistryError::AlreadyPaired { first, second });
        }
        Ok(())
    }

    fn find_same_except(&self, entity: &Entity, except: Option<EntityId>) -> Option<EntityId> {
        self.by_name
            .get(&entity.name().normalized())?
            .iter()
            .copied()
            .filter(|id| Some(*id) != except)
            .find(|id| {
                self.entities
                    .get(id)
                    .is_some_and(|existing| IdentityMatcher::is_same(existing, entity))
            })
    }

    fn index_name(&mut self, id: EntityId, key: String) {
        self.by_name.entry(key).or_default().insert(id);
    }

    fn unindex_name(&mut self, id: EntityId, entity: &Entity) {
        let key = entity.name().normalized();
        if let Some(set) = self.by_name.get_mut(&key) {
            set.remove(&id);
            if set.is_empty() {
                self.by_name.remove(&key);
            }
        }
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        assert!(self.graph.is_symmetric(), "pairing relation lost symmetry");
        for (a, b) in self.graph.edges() {
            let ea = self.entities.get(&a).expect("edge endpoint registered");
            let eb = self.entities.get(&b).expect("edge endpoint registered");
            assert_ne!(a, b);
            assert_ne!(ea.kind(), eb.kind());
        }
        let ids: Vec<_> = self.entities.keys().copied().collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert!(!IdentityMatcher::is_same(&self.entities[a], &self.entities[b]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityBuilder;

    fn student(name: &str, phone: &str) -> Entity {
        EntityBuilder::student().name(name).phone(phone).build().unwrap()
    }

    fn volunteer(name: &str, phone: &str) -> Entity {
        EntityBuilder::volunteer().name(name).phone(phone).build().unwrap()
    }

    fn alice_and_bob() -> (EntityRegistry, EntityId, EntityId) {
        let mut registry = EntityRegistry::new();
        let alice = registry.add(student("Alice", "94351253")).unwrap();
        let bob = registry.add(volunteer("Bob", "98765432")).unwrap();
        (registry, alice, bob)
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let (registry, alice, bob) = alice_and_bob();
        assert_eq!(alice, EntityId::from_raw(0));
        assert_eq!(bob, EntityId::from_raw(1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_add_rejects_identity_duplicate() {
        let mut registry = EntityRegistry::new();
        let first = registry.add(EntityBuilder::student().name("Carl Kurz").build().unwrap()).unwrap();
        let err = registry
            .add(EntityBuilder::student().name("carl kurz ").build().unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateEntity {
                name: "carl kurz ".to_string(),
                existing: first,
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let (mut registry, _alice, bob) = alice_and_bob();
        registry.remove(bob).unwrap();
        let carl = registry.add(volunteer("Carl", "95352563")).unwrap();
        assert_eq!(carl, EntityId::from_raw(2));
    }

    #[test]
    fn test_pair_scenario() {
        let (mut registry, alice, bob) = alice_and_bob();
        registry.pair(alice, bob).unwrap();
        assert_eq!(registry.paired_with(alice).unwrap(), BTreeSet::from([bob]));
        assert_eq!(registry.paired_with(bob).unwrap(), BTreeSet::from([alice]));
        assert!(registry.is_paired(alice, bob));
        assert!(registry.is_paired(bob, alice));
        assert_eq!(registry.edge_count(), 1);
        registry.assert_invariants();
    }

    #[test]
    fn test_pair_errors_in_order() {
        let (mut registry, alice, bob) = alice_and_bob();
        let ghost = EntityId::from_raw(99);
        let dan = registry.add(student("Dan", "91234567")).unwrap();

        assert_eq!(registry.pair(alice, ghost), Err(RegistryError::NotFound(ghost)));
        assert_eq!(registry.pair(alice, alice), Err(RegistryError::SelfPairing(alice)));
        assert_eq!(
            registry.pair(alice, dan),
            Err(RegistryError::SameKind {
                first: alice,
                second: dan,
                kind: EntityKind::Student,
            })
        );
        registry.pair(alice, bob).unwrap();
        assert_eq!(
            registry.pair(bob, alice),
            Err(RegistryError::AlreadyPaired { first: bob, second: alice })
        );
        assert_eq!(registry.edge_count(), 1);
        registry.assert_invariants();
    }

    #[test]
    fn test_same_kind_volunteers_rejected_without_change() {
        let (mut registry, _alice, bob) = alice_and_bob();
        let eve = registry.add(volunteer("Eve", "93331111")).unwrap();
        let before = registry.edges();
        assert!(matches!(registry.pair(bob, eve), Err(RegistryError::SameKind { .. })));
        assert_eq!(registry.edges(), before);
    }

    #[test]
    fn test_unpair() {
        let (mut registry, alice, bob) = alice_and_bob();
        assert_eq!(
            registry.unpair(alice, bob),
            Err(RegistryError::NotPaired { first: alice, second: bob })
        );
        registry.pair(alice, bob).unwrap();
        registry.unpair(bob, alice).unwrap();
        assert!(!registry.is_paired(alice, bob));
        assert!(registry.paired_with(alice).unwrap().is_empty());
        assert_eq!(
            registry.unpair(alice, EntityId::from_raw(42)),
            Err(RegistryError::NotFound(EntityId::from_raw(42)))
        );
    }

    #[test]
    fn test_replace_keeps_pairings() {
        let (mut registry, alice, bob) = alice_and_bob();
        registry.pair(alice, bob).unwrap();
        let edited = registry.get(alice).unwrap().to_builder().name("Alice Pauline").tag("Math").build().unwrap();
        let previous = registry.replace(alice, edited.clone()).unwrap();
        assert_eq!(previous.name().as_str(), "Alice");
        assert_eq!(registry.get(alice), Some(&edited));
        assert_eq!(registry.paired_with(alice).unwrap(), BTreeSet::from([bob]));
        assert_eq!(registry.find_same(&edited), Some(alice));
        registry.assert_invariants();
    }

    #[test]
    fn test_replace_with_identity_equivalent_self_is_allowed() {
        let (mut registry, alice, _bob) = alice_and_bob();
        let edited = registry.get(alice).unwrap().to_builder().name("ALICE").build().unwrap();
        registry.replace(alice, edited).unwrap();
        assert_eq!(registry.get(alice).unwrap().name().as_str(), "ALICE");
    }

    #[test]
    fn test_replace_same_name_stays_indexed() {
        let (mut registry, alice, _bob) = alice_and_bob();
        let edited = registry.get(alice).unwrap().to_builder().tag("Math").build().unwrap();
        registry.replace(alice, edited).unwrap();
        assert_eq!(registry.find_same(&student("alice", "94351253")), Some(alice));
        assert!(registry.add(student("Alice", "94351253")).unwrap_err().is_duplicate());
    }

    #[test]
    fn test_replace_collision_with_other() {
        let (mut registry, alice, bob) = alice_and_bob();
        let clash = EntityBuilder::student().name("bob").phone("98765432").build().unwrap();
        assert_eq!(
            registry.replace(alice, clash),
            Err(RegistryError::DuplicateEntity {
                name: "bob".to_string(),
                existing: bob,
            })
        );
        assert_eq!(registry.get(alice).unwrap().name().as_str(), "Alice");
    }

    #[test]
    fn test_replace_unknown_id() {
        let mut registry = EntityRegistry::new();
        let ghost = EntityId::from_raw(3);
        assert_eq!(registry.replace(ghost, student("Zed", "999")), Err(RegistryError::NotFound(ghost)));
    }

    #[test]
    fn test_replace_kind_change() {
        let (mut registry, alice, bob) = alice_and_bob();
        let flipped = registry.get(alice).unwrap().to_builder().kind(EntityKind::Volunteer).build().unwrap();

        registry.pair(alice, bob).unwrap();
        assert!(matches!(
            registry.replace(alice, flipped.clone()),
            Err(RegistryError::SameKind { kind: EntityKind::Volunteer, .. })
        ));

        registry.unpair(alice, bob).unwrap();
        registry.replace(alice, flipped).unwrap();
        assert_eq!(registry.get(alice).unwrap().kind(), EntityKind::Volunteer);
    }

    #[test]
    fn test_remove_drops_incident_edges() {
        let (mut registry, alice, bob) = alice_and_bob();
        let carl = registry.add(volunteer("Carl", "95352563")).unwrap();
        registry.pair(alice, bob).unwrap();
        registry.pair(alice, carl).unwrap();

        registry.remove(alice).unwrap();
        assert!(!registry.paired_with(bob).unwrap().contains(&alice));
        assert!(!registry.paired_with(carl).unwrap().contains(&alice));
        assert_eq!(registry.edge_count(), 0);
        assert_eq!(registry.remove(alice), Err(RegistryError::NotFound(alice)));
        assert!(registry.find_same(&student("Alice", "94351253")).is_none());
        registry.assert_invariants();
    }

    #[test]
    fn test_all_preserves_insertion_order_across_edits() {
        let mut registry = EntityRegistry::new();
        let a = registry.add(student("A", "111")).unwrap();
        let b = registry.add(volunteer("B", "222")).unwrap();
        let c = registry.add(student("C", "333")).unwrap();
        registry.replace(a, student("A Prime", "111")).unwrap();
        registry.remove(b).unwrap();

        let names: Vec<_> = registry.all().map(|(_, e)| e.name().to_string()).collect();
        assert_eq!(names, vec!["A Prime", "C"]);
        let ids: Vec<_> = registry.all().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, c]);
        // restartable
        assert_eq!(registry.all().count(), 2);
    }

    #[test]
    fn test_of_kind_and_paired_entities() {
        let (mut registry, alice, bob) = alice_and_bob();
        let dan = registry.add(student("Dan", "91234567")).unwrap();
        registry.pair(alice, bob).unwrap();
        registry.pair(dan, bob).unwrap();

        let students: Vec<_> = registry.of_kind(EntityKind::Student).map(|(id, _)| id).collect();
        assert_eq!(students, vec![alice, dan]);

        let partners: Vec<_> = registry.paired_entities(bob).unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(partners, vec![alice, dan]);
    }

    #[test]
    fn test_pair_many_all_or_nothing() {
        let (mut registry, alice, bob) = alice_and_bob();
        let carl = registry.add(volunteer("Carl", "95352563")).unwrap();
        let dan = registry.add(student("Dan", "91234567")).unwrap();
        let ghost = EntityId::from_raw(77);

        let err = registry.pair_many(alice, &[bob, dan, ghost, carl]).unwrap_err();
        let RegistryError::PairingRejected { owner, failures } = err else {
            panic!("expected PairingRejected");
        };
        assert_eq!(owner, alice);
        let failed: Vec<_> = failures.iter().map(|(id, _)| *id).collect();
        assert_eq!(failed, vec![dan, ghost]);
        assert_eq!(registry.edge_count(), 0);

        let paired = registry.pair_many(alice, &[bob, carl, bob]).unwrap();
        assert_eq!(paired, vec![bob, carl]);
        assert_eq!(registry.paired_with(alice).unwrap(), BTreeSet::from([bob, carl]));
        registry.assert_invariants();
    }

    #[test]
    fn test_pair_many_unknown_owner() {
        let (mut registry, _alice, bob) = alice_and_bob();
        let ghost = EntityId::from_raw(5);
        assert_eq!(registry.pair_many(ghost, &[bob]), Err(RegistryError::NotFound(ghost)));
    }

    #[test]
    fn test_replace_all_renumbers_and_clears_graph() {
        let (mut registry, alice, bob) = alice_and_bob();
        registry.pair(alice, bob).unwrap();
        registry
            .replace_all(vec![volunteer("X", "111"), student("Y", "222"), student("Z", "333")])
            .unwrap();
        let ids: Vec<_> = registry.all().map(|(id, _)| id.as_u64()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(registry.edge_count(), 0);
        assert_eq!(registry.add(student("W", "444")).unwrap(), EntityId::from_raw(3));
    }

    #[test]
    fn test_replace_all_rejects_batch_atomically() {
        let (mut registry, alice, bob) = alice_and_bob();
        registry.pair(alice, bob).unwrap();
        let err = registry
            .replace_all(vec![student("X", "111"), student("Y", "222"), volunteer("x ", "111")])
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateInBatch {
                first: 0,
                second: 2,
                name: "x ".to_string(),
            }
        );
        assert_eq!(registry.len(), 2);
        assert!(registry.is_paired(alice, bob));
    }

    #[test]
    fn test_events_follow_successful_mutations_only() {
        let mut registry = EntityRegistry::new();
        let watch = registry.subscribe(16);
        let alice = registry.add(student("Alice", "94351253")).unwrap();
        let bob = registry.add(volunteer("Bob", "98765432")).unwrap();
        let _ = registry.add(student("alice", "94351253"));
        registry.pair(alice, bob).unwrap();
        let _ = registry.pair(alice, bob);
        registry.remove(bob).unwrap();

        assert_eq!(
            watch.drain(),
            vec![
                RegistryEvent::Added { id: alice },
                RegistryEvent::Added { id: bob },
                RegistryEvent::Paired { first: alice, second: bob },
                RegistryEvent::Removed {
                    id: bob,
                    former_partners: BTreeSet::from([alice]),
                },
            ]
        );
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId::from_raw(12).to_string(), "#12");
    }
}
