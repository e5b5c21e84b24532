//! Read-only lookups over the registry used by the find commands.

use super::{EntityId, EntityRegistry};
use crate::entity::{Entity, Tag};

impl EntityRegistry {
    /// Entities carrying at least one of `tags`, compared case-insensitively.
    ///
    /// Results are ordered by descending number of matching tags; ties keep
    /// insertion order.
    #[must_use]
    pub fn find_by_tags(&self, tags: &[Tag]) -> Vec<(EntityId, &Entity)> {
        let mut hits: Vec<(usize, EntityId, &Entity)> = self
            .all()
            .filter_map(|(id, entity)| {
                let matched = entity.tags().iter().filter(|t| tags.iter().any(|q| t.matches(q))).count();
                (matched > 0).then_some((matched, id, entity))
            })
            .collect();
        // stable sort keeps insertion order among equal counts
        hits.sort_by(|a, b| b.0.cmp(&a.0));
        hits.into_iter().map(|(_, id, entity)| (id, entity)).collect()
    }

    /// Entities whose name contains any keyword as a whole word, ignoring case.
    ///
    /// Keywords are trimmed; blank keywords match nothing.
    #[must_use]
    pub fn find_by_name<S: AsRef<str>>(&self, keywords: &[S]) -> Vec<(EntityId, &Entity)> {
        let wanted: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if wanted.is_empty() {
            return Vec::new();
        }

        self.all()
            .filter(|(_, entity)| {
                entity
                    .name()
                    .as_str()
                    .split_whitespace()
                    .any(|word| wanted.iter().any(|k| word.to_lowercase() == *k))
            })
            .collect()
    }
}
