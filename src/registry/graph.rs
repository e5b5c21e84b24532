//! Symmetric adjacency bookkeeping for the pairing relation.
//!
//! The graph knows nothing about entities or kinds; the registry validates a
//! pairing before it reaches here. What the graph does guarantee is that every
//! edge is stored in both directions and that no mutator touches only one.

use std::collections::{BTreeSet, HashMap};

use super::EntityId;

#[derive(Debug, Clone, Default)]
pub(crate) struct RelationGraph {
    adjacency: HashMap<EntityId, BTreeSet<EntityId>>,
    edge_count: usize,
}

impl RelationGraph {
    /// Inserts the undirected edge `a ~ b`. Returns false if it already existed.
    pub(crate) fn insert(&mut self, a: EntityId, b: EntityId) -> bool {
        debug_assert_ne!(a, b, "self edges are rejected by the registry");
        if !self.adjacency.entry(a).or_default().insert(b) {
            return false;
        }
        self.adjacency.entry(b).or_default().insert(a);
        self.edge_count += 1;
        true
    }

    /// Removes the undirected edge `a ~ b`. Returns false if it was absent.
    pub(crate) fn remove(&mut self, a: EntityId, b: EntityId) -> bool {
        if !self.detach(a, b) {
            return false;
        }
        self.detach(b, a);
        self.edge_count -= 1;
        true
    }

    fn detach(&mut self, from: EntityId, to: EntityId) -> bool {
        let Some(set) = self.adjacency.get_mut(&from) else {
            return false;
        };
        let removed = set.remove(&to);
        if set.is_empty() {
            self.adjacency.remove(&from);
        }
        removed
    }

    /// Drops every edge incident to `id`, returning the former partners.
    pub(crate) fn remove_vertex(&mut self, id: EntityId) -> BTreeSet<EntityId> {
        let partners = self.adjacency.remove(&id).unwrap_or_default();
        for partner in &partners {
            self.detach(*partner, id);
        }
        self.edge_count -= partners.len();
        partners
    }

    pub(crate) fn contains(&self, a: EntityId, b: EntityId) -> bool {
        self.adjacency.get(&a).is_some_and(|set| set.contains(&b))
    }

    pub(crate) fn neighbors(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.adjacency.get(&id).into_iter().flatten().copied()
    }

    #[cfg(test)]
    pub(crate) fn degree(&self, id: EntityId) -> usize {
        self.adjacency.get(&id).map_or(0, BTreeSet::len)
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Every edge once, as `(smaller, larger)`, sorted.
    pub(crate) fn edges(&self) -> Vec<(EntityId, EntityId)> {
        let mut out: Vec<_> = self
            .adjacency
            .iter()
            .flat_map(|(a, set)| set.iter().filter(move |b| a < *b).map(move |b| (*a, *b)))
            .collect();
        out.sort_unstable();
        out
    }

    pub(crate) fn clear(&mut self) {
        self.adjacency.clear();
        self.edge_count = 0;
    }

    /// Returns true if every stored direction has its mirror.
    #[cfg(test)]
    pub(crate) fn is_symmetric(&self) -> bool {
        self.adjacency
            .iter()
            .all(|(a, set)| set.iter().all(|b| self.contains(*b, *a)))
    }
}
