//! Core data types for the respawn catalog and tracked observations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Respawn delay bounds for one (entity, location) pairing, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRule {
    pub min: u32,
    pub max: u32,
}

impl SpawnRule {
    /// Create a rule, rejecting bounds where `min > max`.
    pub fn new(min: u32, max: u32) -> TrackerResult<Self> {
        if min > max {
            return Err(TrackerError::Validation(
                "min respawn time is greater than max respawn time".to_string(),
            ));
        }
        Ok(Self { min, max })
    }

    /// `"60~70"`, or just `"60"` when both bounds agree.
    pub fn duration_label(&self) -> String {
        if self.min == self.max {
            self.min.to_string()
        } else {
            format!("{}~{}", self.min, self.max)
        }
    }
}

/// Catalog entry for one entity: its explicit aliases and spawn locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    #[serde(default)]
    pub aliases: Vec<String>,
    pub spawns: BTreeMap<String, SpawnRule>,
}

impl EntityConfig {
    /// An entity with a single spawn location and no explicit aliases.
    pub fn single(location: impl Into<String>, rule: SpawnRule) -> Self {
        let mut spawns = BTreeMap::new();
        spawns.insert(location.into(), rule);
        Self {
            aliases: Vec::new(),
            spawns,
        }
    }
}

/// Identifies one spawn: an (entity, location) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnKey {
    pub entity: String,
    pub location: String,
}

impl SpawnKey {
    pub fn new(entity: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for SpawnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.entity, self.location)
    }
}

/// The live respawn signal of a tracked spawn at some instant.
///
/// Times are absolute minutes on the session clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnSignal {
    pub min_time: f64,
    pub max_time: f64,
    pub probability: f64,
}

/// Errors that can occur in the tracking engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} is not a recognized boss or alias")]
    UnknownEntity(String),

    #[error("{location} is not a spawn of {entity}")]
    UnknownSpawn { entity: String, location: String },

    #[error("\"{0}\" is already the name of a boss")]
    DuplicateName(String),

    #[error("{0}")]
    PredicateCompile(String),

    #[error(
        "a time of death window longer than the max spawn time ({max} minutes) is not supported"
    )]
    WindowTooLong { max: u32 },
}

/// Convenience result type.
pub type TrackerResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_rejects_inverted_bounds() {
        assert!(SpawnRule::new(70, 60).is_err());
        assert_eq!(SpawnRule::new(60, 70).unwrap().duration_label(), "60~70");
        assert_eq!(SpawnRule::new(30, 30).unwrap().duration_label(), "30");
    }

    #[test]
    fn test_spawn_key_display() {
        let key = SpawnKey::new("Atroce", "Valkyrie");
        assert_eq!(key.to_string(), "Atroce (Valkyrie)");
    }
}
