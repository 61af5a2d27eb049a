//! The entity catalog: what can be tracked, where, and under which names.

use std::collections::{BTreeMap, BTreeSet};

use crate::resolver::{normalize, NameIndex};
use crate::types::{EntityConfig, SpawnKey, SpawnRule, TrackerError, TrackerResult};

/// Every trackable entity of a group, with a name index kept in sync.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entities: BTreeMap<String, EntityConfig>,
    index: NameIndex,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from stored configs.
    ///
    /// Implicit aliases are only derived for freshly seeded catalogs; stored
    /// catalogs already carry whatever aliases their editors left them with.
    pub fn from_entities(
        entities: BTreeMap<String, EntityConfig>,
        implicit_aliases: bool,
    ) -> TrackerResult<Self> {
        let mut catalog = Self::new();
        for (name, config) in entities {
            catalog.insert_entity(&name, config, implicit_aliases)?;
        }
        Ok(catalog)
    }

    /// Add a new entity. Fails if the name is taken.
    pub fn insert_entity(
        &mut self,
        name: &str,
        config: EntityConfig,
        implicit_aliases: bool,
    ) -> TrackerResult<()> {
        if self.entities.contains_key(name) {
            return Err(TrackerError::DuplicateName(name.to_string()));
        }
        for rule in config.spawns.values() {
            SpawnRule::new(rule.min, rule.max)?;
        }
        let mut aliases: BTreeSet<String> = config.aliases.iter().cloned().collect();
        if implicit_aliases && name.contains(' ') {
            aliases.extend(derived_aliases(name));
        }
        self.entities.insert(
            name.to_string(),
            EntityConfig {
                aliases: Vec::new(),
                spawns: config.spawns,
            },
        );
        self.set_aliases(name, aliases);
        Ok(())
    }

    /// Add a spawn location to an existing entity.
    pub fn add_spawn(&mut self, entity: &str, location: &str, rule: SpawnRule) -> TrackerResult<()> {
        let config = self
            .entities
            .get_mut(entity)
            .ok_or_else(|| TrackerError::UnknownEntity(entity.to_string()))?;
        if config.spawns.contains_key(location) {
            return Err(TrackerError::Validation(format!(
                "{location} is already the name of a spawn for {entity}"
            )));
        }
        config.spawns.insert(location.to_string(), rule);
        Ok(())
    }

    /// Remove one spawn. Returns `true` when that was the entity's last
    /// spawn and the entity itself is gone too.
    pub fn remove_spawn(&mut self, key: &SpawnKey) -> TrackerResult<bool> {
        let config = self.entity_mut(key)?;
        config.spawns.remove(&key.location);
        if !config.spawns.is_empty() {
            return Ok(false);
        }
        self.unindex(&key.entity);
        self.entities.remove(&key.entity);
        Ok(true)
    }

    /// Rename an entity and replace its alias set.
    pub fn update_entity(
        &mut self,
        entity: &str,
        new_name: &str,
        aliases: BTreeSet<String>,
    ) -> TrackerResult<()> {
        if !self.entities.contains_key(entity) {
            return Err(TrackerError::UnknownEntity(entity.to_string()));
        }
        if new_name != entity && self.entities.contains_key(new_name) {
            return Err(TrackerError::DuplicateName(new_name.to_string()));
        }
        self.unindex(entity);
        if new_name != entity {
            if let Some(config) = self.entities.remove(entity) {
                self.entities.insert(new_name.to_string(), config);
            }
        }
        self.set_aliases(new_name, aliases);
        Ok(())
    }

    /// Change a spawn's bounds and optionally move it to a new location name.
    pub fn update_spawn(
        &mut self,
        key: &SpawnKey,
        new_location: &str,
        rule: SpawnRule,
    ) -> TrackerResult<SpawnKey> {
        let rule = SpawnRule::new(rule.min, rule.max)?;
        let config = self.entity_mut(key)?;
        if new_location != key.location && config.spawns.contains_key(new_location) {
            return Err(TrackerError::Validation(format!(
                "{new_location} is already a name of a spawn for {}",
                key.entity
            )));
        }
        config.spawns.remove(&key.location);
        config.spawns.insert(new_location.to_string(), rule);
        Ok(SpawnKey::new(key.entity.clone(), new_location))
    }

    pub fn entity(&self, name: &str) -> Option<&EntityConfig> {
        self.entities.get(name)
    }

    pub fn entities(&self) -> &BTreeMap<String, EntityConfig> {
        &self.entities
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn rule(&self, key: &SpawnKey) -> Option<SpawnRule> {
        self.entities
            .get(&key.entity)
            .and_then(|config| config.spawns.get(&key.location))
            .copied()
    }

    pub fn resolve(&self, query: &str) -> BTreeSet<String> {
        self.index.resolve(query)
    }

    /// True when `entities` names exactly one entity with exactly one spawn.
    pub fn is_unambiguous(&self, entities: &BTreeSet<String>) -> bool {
        entities.len() == 1
            && entities
                .iter()
                .next()
                .and_then(|entity| self.entities.get(entity))
                .is_some_and(|config| config.spawns.len() == 1)
    }

    pub fn first_spawn(&self, entities: &BTreeSet<String>) -> Option<SpawnKey> {
        let entity = entities.iter().next()?;
        let location = self.entities.get(entity)?.spawns.keys().next()?;
        Some(SpawnKey::new(entity.clone(), location.clone()))
    }

    /// Every spawn of `entities`, labelled and sorted for a prompt.
    pub fn spawn_options(&self, entities: &BTreeSet<String>) -> Vec<(String, SpawnKey)> {
        let mut options: Vec<(String, SpawnKey)> = entities
            .iter()
            .filter_map(|entity| self.entities.get(entity).map(|config| (entity, config)))
            .flat_map(|(entity, config)| {
                config
                    .spawns
                    .keys()
                    .map(move |location| SpawnKey::new(entity.clone(), location.clone()))
            })
            .map(|key| (self.label(&key), key))
            .collect();
        options.sort_by_key(|(label, _)| label.replace(['(', ')'], ""));
        options
    }

    /// Display label: the bare entity name unless it has several spawns.
    pub fn label(&self, key: &SpawnKey) -> String {
        match self.entities.get(&key.entity) {
            Some(config) if config.spawns.len() > 1 => key.to_string(),
            _ => key.entity.clone(),
        }
    }

    /// Every name the entity resolves under, normalized.
    pub fn names(&self, entity: &str) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .entities
            .get(entity)
            .map(|config| config.aliases.iter().map(|alias| normalize(alias)).collect())
            .unwrap_or_default();
        names.insert(normalize(entity));
        names
    }

    /// Human-readable summary of an entity and its spawns.
    pub fn describe(&self, entity: &str) -> Option<String> {
        let config = self.entities.get(entity)?;
        let aka = if config.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aka {})", config.aliases.join(", "))
        };
        if config.spawns.len() == 1 {
            let rule = config.spawns.values().next()?;
            return Some(format!("{entity}{aka}: {}~{}", rule.min, rule.max));
        }
        let spawns = config
            .spawns
            .iter()
            .map(|(location, rule)| format!("{location}: {}", rule.duration_label()))
            .collect::<Vec<_>>()
            .join("\n    ");
        Some(format!("{entity}{aka}:\n    {spawns}"))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn entity_mut(&mut self, key: &SpawnKey) -> TrackerResult<&mut EntityConfig> {
        let config = self
            .entities
            .get_mut(&key.entity)
            .ok_or_else(|| TrackerError::UnknownEntity(key.entity.clone()))?;
        if !config.spawns.contains_key(&key.location) {
            return Err(TrackerError::UnknownSpawn {
                entity: key.entity.clone(),
                location: key.location.clone(),
            });
        }
        Ok(config)
    }

    fn set_aliases(&mut self, entity: &str, aliases: BTreeSet<String>) {
        let mut sorted: Vec<String> = aliases.into_iter().filter(|a| !a.is_empty()).collect();
        sorted.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        if let Some(config) = self.entities.get_mut(entity) {
            config.aliases = sorted;
        }
        for name in self.names(entity) {
            self.index.insert(&name, entity);
        }
    }

    fn unindex(&mut self, entity: &str) {
        for name in self.names(entity) {
            self.index.remove(&name, entity);
        }
    }
}

/// Aliases derived from a multi-word name: squashed and initials.
fn derived_aliases(name: &str) -> [String; 2] {
    let squashed = name.to_lowercase().replace(' ', "");
    let initials = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_lowercase)
        .collect();
    [squashed, initials]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> EntityCatalog {
        let mut catalog = EntityCatalog::new();
        catalog
            .insert_entity("Atroce", EntityConfig::single("Valkyrie", SpawnRule { min: 240, max: 250 }), true)
            .unwrap();
        let mut spawns = BTreeMap::new();
        spawns.insert("Orc Dungeon".to_string(), SpawnRule { min: 60, max: 70 });
        spawns.insert("Glast Heim".to_string(), SpawnRule { min: 120, max: 130 });
        catalog
            .insert_entity("Orc Lord", EntityConfig { aliases: vec!["ol".into()], spawns }, true)
            .unwrap();
        catalog
    }

    #[test]
    fn test_implicit_aliases() {
        let catalog = catalog();
        assert_eq!(catalog.entity("Orc Lord").unwrap().aliases, vec!["ol", "orclord"]);
        assert!(catalog.resolve("orclord").contains("Orc Lord"));
        assert!(catalog.resolve("orc_l").contains("Orc Lord"));
    }

    #[test]
    fn test_no_implicit_aliases_for_stored_catalog() {
        let mut catalog = EntityCatalog::new();
        catalog
            .insert_entity("Dark Lord", EntityConfig::single("GH", SpawnRule { min: 60, max: 70 }), false)
            .unwrap();
        assert!(catalog.entity("Dark Lord").unwrap().aliases.is_empty());
        assert!(catalog.resolve("dl").is_empty());
    }

    #[test]
    fn test_labels_and_options() {
        let catalog = catalog();
        assert_eq!(catalog.label(&SpawnKey::new("Atroce", "Valkyrie")), "Atroce");
        assert_eq!(
            catalog.label(&SpawnKey::new("Orc Lord", "Glast Heim")),
            "Orc Lord (Glast Heim)"
        );
        let options = catalog.spawn_options(&catalog.resolve("o"));
        let labels: Vec<_> = options.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["Orc Lord (Glast Heim)", "Orc Lord (Orc Dungeon)"]);
    }

    #[test]
    fn test_unambiguous() {
        let catalog = catalog();
        assert!(catalog.is_unambiguous(&catalog.resolve("atr")));
        assert!(!catalog.is_unambiguous(&catalog.resolve("ol")));
        assert_eq!(
            catalog.first_spawn(&catalog.resolve("atr")),
            Some(SpawnKey::new("Atroce", "Valkyrie"))
        );
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let mut catalog = catalog();
        let err = catalog
            .insert_entity("Atroce", EntityConfig::single("X", SpawnRule { min: 1, max: 2 }), false)
            .unwrap_err();
        assert_eq!(err, TrackerError::DuplicateName("Atroce".into()));
    }

    #[test]
    fn test_rename_moves_names() {
        let mut catalog = catalog();
        let aliases: BTreeSet<String> = ["orc".to_string()].into_iter().collect();
        catalog.update_entity("Orc Lord", "Orc Hero", aliases).unwrap();
        assert!(catalog.resolve("ol").is_empty());
        assert!(catalog.resolve("orclord").is_empty());
        assert!(catalog.resolve("orc_hero").contains("Orc Hero"));
        assert!(catalog.resolve("orc").contains("Orc Hero"));
        assert!(!catalog.contains("Orc Lord"));
    }

    #[test]
    fn test_rename_conflict() {
        let mut catalog = catalog();
        let err = catalog
            .update_entity("Orc Lord", "Atroce", BTreeSet::new())
            .unwrap_err();
        assert_eq!(err, TrackerError::DuplicateName("Atroce".into()));
    }

    #[test]
    fn test_update_spawn_validates() {
        let mut catalog = catalog();
        let key = SpawnKey::new("Orc Lord", "Orc Dungeon");
        assert!(catalog
            .update_spawn(&key, "Glast Heim", SpawnRule { min: 60, max: 70 })
            .is_err());
        assert!(catalog
            .update_spawn(&key, "Orc Dungeon", SpawnRule { min: 80, max: 70 })
            .is_err());
        let moved = catalog
            .update_spawn(&key, "Orc Village", SpawnRule { min: 50, max: 55 })
            .unwrap();
        assert_eq!(catalog.rule(&moved), Some(SpawnRule { min: 50, max: 55 }));
        assert_eq!(catalog.rule(&key), None);
    }

    #[test]
    fn test_remove_last_spawn_removes_entity() {
        let mut catalog = catalog();
        assert!(!catalog
            .remove_spawn(&SpawnKey::new("Orc Lord", "Glast Heim"))
            .unwrap());
        assert!(catalog
            .remove_spawn(&SpawnKey::new("Orc Lord", "Orc Dungeon"))
            .unwrap());
        assert!(catalog.resolve("ol").is_empty());
        assert!(!catalog.contains("Orc Lord"));
    }

    #[test]
    fn test_describe() {
        let catalog = catalog();
        assert_eq!(catalog.describe("Atroce").unwrap(), "Atroce: 240~250");
        assert_eq!(
            catalog.describe("Orc Lord").unwrap(),
            "Orc Lord (aka ol, orclord):\n    Glast Heim: 120~130\n    Orc Dungeon: 60~70"
        );
    }
}
