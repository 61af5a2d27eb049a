//! Prefix-based name resolution over a sorted alias index.

use std::collections::{BTreeMap, BTreeSet};

/// Normalize a user-typed or catalog name for lookup.
pub fn normalize(name: &str) -> String {
    name.trim().replace(' ', "_").to_lowercase()
}

/// Sorted mapping of normalized names to the entities they refer to.
///
/// One name may refer to several entities; lookups are by prefix.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    names: BTreeMap<String, BTreeSet<String>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as referring to `entity`.
    pub fn insert(&mut self, name: &str, entity: &str) {
        self.names
            .entry(normalize(name))
            .or_default()
            .insert(entity.to_string());
    }

    /// Drop the association between `name` and `entity`.
    pub fn remove(&mut self, name: &str, entity: &str) {
        let key = normalize(name);
        if let Some(entities) = self.names.get_mut(&key) {
            entities.remove(entity);
            if entities.is_empty() {
                self.names.remove(&key);
            }
        }
    }

    /// Resolve a query to the set of entities it could mean.
    ///
    /// An exact match wins outright. Otherwise every name starting with the
    /// query contributes its entities.
    pub fn resolve(&self, query: &str) -> BTreeSet<String> {
        let query = normalize(query);
        if query.is_empty() {
            return BTreeSet::new();
        }
        if let Some(exact) = self.names.get(&query) {
            return exact.clone();
        }
        self.names
            .range(query.clone()..)
            .take_while(|(name, _)| name.starts_with(&query))
            .flat_map(|(_, entities)| entities.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
