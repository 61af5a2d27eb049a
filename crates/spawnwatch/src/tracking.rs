//! Live observations: which spawns are tracked, since when, and which alert
//! rules are still waiting to fire for each.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::alerts::RuleId;
use crate::types::SpawnKey;

/// One tracked spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedSpawn {
    /// Latest possible time of death, in session minutes.
    pub tod: f64,
    /// Minutes before `tod` during which the death happened.
    pub window: f64,
    /// Rules that have not fired yet for this observation.
    pub pending: BTreeSet<RuleId>,
}

#[derive(Debug, Clone, Default)]
pub struct TrackingStore {
    spawns: BTreeMap<SpawnKey, TrackedSpawn>,
}

impl TrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) tracking a spawn.
    pub fn insert(&mut self, key: SpawnKey, spawn: TrackedSpawn) {
        self.spawns.insert(key, spawn);
    }

    /// Stop tracking. Returns whether the spawn was tracked.
    pub fn cancel(&mut self, key: &SpawnKey) -> bool {
        self.spawns.remove(key).is_some()
    }

    pub fn clear(&mut self) -> usize {
        let count = self.spawns.len();
        self.spawns.clear();
        count
    }

    pub fn get(&self, key: &SpawnKey) -> Option<&TrackedSpawn> {
        self.spawns.get(key)
    }

    pub fn get_mut(&mut self, key: &SpawnKey) -> Option<&mut TrackedSpawn> {
        self.spawns.get_mut(key)
    }

    pub fn contains(&self, key: &SpawnKey) -> bool {
        self.spawns.contains_key(key)
    }

    /// Move the observation of `from` to `to`, keeping its pending rules.
    pub fn rekey(&mut self, from: &SpawnKey, to: SpawnKey) {
        if let Some(spawn) = self.spawns.remove(from) {
            self.spawns.insert(to, spawn);
        }
    }

    /// Drop a rule from every spawn's pending set.
    pub fn forget_rule(&mut self, id: RuleId) {
        for spawn in self.spawns.values_mut() {
            spawn.pending.remove(&id);
        }
    }

    pub fn keys(&self) -> Vec<SpawnKey> {
        self.spawns.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SpawnKey, &TrackedSpawn)> {
        self.spawns.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&SpawnKey, &mut TrackedSpawn)> {
        self.spawns.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.spawns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty()
    }
}
