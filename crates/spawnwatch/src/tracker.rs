//! One group's tracking state: catalog, live observations and alert rules,
//! kept consistent with each other.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::alerts::{AlertRules, RuleId};
use crate::catalog::EntityCatalog;
use crate::format::status_row;
use crate::paginator::BoardRow;
use crate::predicate::Bindings;
use crate::probability::spawn_signal;
use crate::tracking::{TrackedSpawn, TrackingStore};
use crate::types::{
    EntityConfig, SpawnKey, SpawnRule, SpawnSignal, TrackerError, TrackerResult,
};

/// A rule that became true for a tracked spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertFiring {
    pub key: SpawnKey,
    pub label: String,
    pub rule: String,
}

/// Outcome of removing a spawn from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovedSpawn {
    pub was_tracked: bool,
    pub entity_removed: bool,
}

/// Serializable form of a [`Tracker`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    #[serde(default)]
    pub alerts: Vec<String>,
    #[serde(default)]
    pub bosses: BTreeMap<String, EntityConfig>,
    #[serde(default)]
    pub tracking: Vec<TrackingRecord>,
}

/// A tracked spawn as stored on disk. Pending rules are stored by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub entity: String,
    pub location: String,
    pub tod: f64,
    pub window: f64,
    #[serde(default)]
    pub pending: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Tracker {
    catalog: EntityCatalog,
    store: TrackingStore,
    rules: AlertRules,
}

impl Tracker {
    pub fn new(catalog: EntityCatalog) -> Self {
        Self {
            catalog,
            store: TrackingStore::new(),
            rules: AlertRules::new(),
        }
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &TrackingStore {
        &self.store
    }

    pub fn rules(&self) -> &AlertRules {
        &self.rules
    }

    pub fn label(&self, key: &SpawnKey) -> String {
        self.catalog.label(key)
    }

    /// Live signal of a tracked spawn at `now`.
    pub fn signal(&self, key: &SpawnKey, now: f64) -> Option<SpawnSignal> {
        let tracked = self.store.get(key)?;
        let rule = self.catalog.rule(key)?;
        Some(spawn_signal(now, tracked.tod, rule, tracked.window))
    }

    fn rule_for(&self, key: &SpawnKey) -> TrackerResult<SpawnRule> {
        self.catalog.rule(key).ok_or_else(|| TrackerError::UnknownSpawn {
            entity: key.entity.clone(),
            location: key.location.clone(),
        })
    }

    /// Record a death observation, replacing any previous one for the spawn.
    ///
    /// Rules already true at the time of death are not armed.
    pub fn track(&mut self, key: &SpawnKey, tod: f64, window: f64) -> TrackerResult<()> {
        let rule = self.rule_for(key)?;
        if window > f64::from(rule.max) {
            return Err(TrackerError::WindowTooLong { max: rule.max });
        }
        if window < 0.0 {
            return Err(TrackerError::Validation(
                "alive time should be before death time".to_string(),
            ));
        }
        let signal = spawn_signal(tod, tod, rule, window);
        let already = self.rules.holding(&Bindings::from_signal(tod, &signal));
        let pending = self.rules.ids().difference(&already).copied().collect();
        self.store.insert(
            key.clone(),
            TrackedSpawn {
                tod,
                window,
                pending,
            },
        );
        tracing::debug!("Tracking {} from {:.1} (window {:.1})", key, tod, window);
        Ok(())
    }

    /// Window to use when the death time is unknown and only absence was
    /// observed at `tod`.
    ///
    /// A later sighting of an already tracked spawn narrows the window to the
    /// time since its earliest possible respawn; otherwise the whole max
    /// delay is assumed.
    pub fn unknown_window(&self, key: &SpawnKey, tod: f64) -> TrackerResult<f64> {
        let rule = self.rule_for(key)?;
        let max = f64::from(rule.max);
        match self.store.get(key) {
            Some(previous) if tod > previous.tod => {
                let signal = spawn_signal(tod, previous.tod, rule, previous.window);
                if tod < signal.min_time {
                    return Err(TrackerError::Validation(format!(
                        "{} cannot have respawned since it was last tracked",
                        self.label(key)
                    )));
                }
                Ok((tod - signal.min_time).min(max))
            }
            _ => Ok(max),
        }
    }

    pub fn cancel(&mut self, key: &SpawnKey) -> bool {
        self.store.cancel(key)
    }

    pub fn cancel_all(&mut self) -> usize {
        self.store.clear()
    }

    /// Cancel the spawn if it has been dead long enough to be stale.
    pub fn check_expire(&mut self, key: &SpawnKey, now: f64, expire: u32) -> bool {
        if expire == 0 {
            return false;
        }
        let (Some(tracked), Some(rule)) = (self.store.get(key), self.catalog.rule(key)) else {
            return false;
        };
        let threshold = (2.0 * f64::from(rule.max)).max(f64::from(expire));
        if now - tracked.tod > threshold {
            self.store.cancel(key);
            tracing::info!("Tracking of {} expired", key);
            return true;
        }
        false
    }

    /// Tracked spawns in board order, after dropping expired ones.
    ///
    /// Spawns whose max spawn time is more than `expire` minutes past sort
    /// last; the rest by descending probability, then earliest spawn time.
    pub fn display_order(&mut self, now: f64, expire: u32) -> Vec<SpawnKey> {
        for key in self.store.keys() {
            self.check_expire(&key, now, expire);
        }
        let mut keyed: Vec<(SpawnKey, (u8, f64, f64))> = self
            .store
            .keys()
            .into_iter()
            .filter_map(|key| {
                let signal = self.signal(&key, now)?;
                let stale = expire > 0 && now - signal.max_time > f64::from(expire);
                let sort = if stale {
                    (1, 0.0, signal.min_time)
                } else {
                    (0, -signal.probability, signal.min_time)
                };
                Some((key, sort))
            })
            .collect();
        keyed.sort_by(|(ka, a), (kb, b)| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.total_cmp(&b.1))
                .then_with(|| a.2.total_cmp(&b.2))
                .then_with(|| ka.cmp(kb))
        });
        keyed.into_iter().map(|(key, _)| key).collect()
    }

    /// Board rows in display order.
    pub fn board_rows(&mut self, now: f64, expire: u32) -> Vec<BoardRow> {
        self.display_order(now, expire)
            .into_iter()
            .filter_map(|key| {
                let signal = self.signal(&key, now)?;
                Some(status_row(&self.label(&key), &signal, now))
            })
            .collect()
    }

    /// Add an alert rule, arming it for every tracked spawn where it is not
    /// already true.
    pub fn add_rule(&mut self, source: &str, now: f64) -> TrackerResult<RuleId> {
        let predicate = AlertRules::compile(source)?;
        let id = self.rules.push(predicate);
        let armed: Vec<SpawnKey> = self
            .store
            .keys()
            .into_iter()
            .filter(|key| {
                let holds = self.signal(key, now).is_some_and(|signal| {
                    self.rules
                        .get(id)
                        .is_some_and(|rule| rule.holds(&Bindings::from_signal(now, &signal)))
                });
                !holds
            })
            .collect();
        for key in armed {
            if let Some(tracked) = self.store.get_mut(&key) {
                tracked.pending.insert(id);
            }
        }
        Ok(id)
    }

    /// Remove the rule at `position` (0-based) and disarm it everywhere.
    pub fn remove_rule(&mut self, position: usize) -> TrackerResult<String> {
        let rule = self.rules.remove_at(position)?;
        self.store.forget_rule(rule.id);
        Ok(rule.source().to_string())
    }

    /// Positions of the rules still pending for a spawn.
    pub fn pending_positions(&self, key: &SpawnKey) -> Option<BTreeSet<usize>> {
        let tracked = self.store.get(key)?;
        Some(
            tracked
                .pending
                .iter()
                .filter_map(|id| self.rules.position(*id))
                .collect(),
        )
    }

    /// Evaluate pending rules at `now`; those that hold fire once and are
    /// disarmed until the spawn is tracked again.
    pub fn fire_alerts(&mut self, now: f64) -> Vec<AlertFiring> {
        let mut firings = Vec::new();
        for key in self.store.keys() {
            let Some(signal) = self.signal(&key, now) else {
                continue;
            };
            let bindings = Bindings::from_signal(now, &signal);
            let label = self.catalog.label(&key);
            let Some(tracked) = self.store.get_mut(&key) else {
                continue;
            };
            let fired: Vec<RuleId> = tracked
                .pending
                .iter()
                .copied()
                .filter(|id| self.rules.get(*id).is_some_and(|rule| rule.holds(&bindings)))
                .collect();
            for id in fired {
                tracked.pending.remove(&id);
                if let Some(rule) = self.rules.get(id) {
                    tracing::info!("Alert `{}` fired for {}", rule.source(), key);
                    firings.push(AlertFiring {
                        key: key.clone(),
                        label: label.clone(),
                        rule: rule.source().to_string(),
                    });
                }
            }
        }
        firings
    }

    /// Tracked spawns of every entity `query` resolves to, sorted.
    pub fn resolve_tracked(&self, query: &str) -> Vec<SpawnKey> {
        let mut keys: Vec<SpawnKey> = self
            .catalog
            .resolve(query)
            .into_iter()
            .filter_map(|entity| self.catalog.entity(&entity).map(|c| (entity, c)))
            .flat_map(|(entity, config)| {
                config
                    .spawns
                    .keys()
                    .map(|location| SpawnKey::new(entity.clone(), location.clone()))
                    .collect::<Vec<_>>()
            })
            .filter(|key| self.store.contains(key))
            .collect();
        keys.sort();
        keys
    }

    /// Add a brand-new entity with one spawn, deriving implicit aliases.
    pub fn add_entity(&mut self, name: &str, location: &str, rule: SpawnRule) -> TrackerResult<()> {
        let rule = SpawnRule::new(rule.min, rule.max)?;
        self.catalog
            .insert_entity(name, EntityConfig::single(location, rule), true)
    }

    pub fn add_spawn(&mut self, entity: &str, location: &str, rule: SpawnRule) -> TrackerResult<()> {
        let rule = SpawnRule::new(rule.min, rule.max)?;
        self.catalog.add_spawn(entity, location, rule)
    }

    /// Remove a spawn from the catalog, cancelling any observation of it.
    pub fn remove_spawn(&mut self, key: &SpawnKey) -> TrackerResult<RemovedSpawn> {
        self.rule_for(key)?;
        let was_tracked = self.store.cancel(key);
        let entity_removed = self.catalog.remove_spawn(key)?;
        Ok(RemovedSpawn {
            was_tracked,
            entity_removed,
        })
    }

    /// Rename an entity and replace its aliases; observations follow.
    pub fn update_entity(
        &mut self,
        entity: &str,
        new_name: &str,
        aliases: BTreeSet<String>,
    ) -> TrackerResult<()> {
        let locations: Vec<String> = self
            .catalog
            .entity(entity)
            .map(|config| config.spawns.keys().cloned().collect())
            .ok_or_else(|| TrackerError::UnknownEntity(entity.to_string()))?;
        self.catalog.update_entity(entity, new_name, aliases)?;
        if new_name != entity {
            for location in locations {
                self.store.rekey(
                    &SpawnKey::new(entity, location.clone()),
                    SpawnKey::new(new_name, location),
                );
            }
        }
        Ok(())
    }

    /// Edit a spawn's bounds and location, and its entity's name and aliases.
    /// Everything is validated before anything changes. A tracked window
    /// longer than the new max delay is cut down to it.
    pub fn update_spawn(
        &mut self,
        key: &SpawnKey,
        new_name: &str,
        new_location: &str,
        rule: SpawnRule,
        aliases: BTreeSet<String>,
    ) -> TrackerResult<SpawnKey> {
        self.rule_for(key)?;
        if new_name != key.entity && self.catalog.contains(new_name) {
            return Err(TrackerError::DuplicateName(new_name.to_string()));
        }
        let moved = self.catalog.update_spawn(key, new_location, rule)?;
        if moved != *key {
            self.store.rekey(key, moved.clone());
        }
        if let Some(tracked) = self.store.get_mut(&moved) {
            let max = f64::from(rule.max);
            if tracked.window > max {
                tracing::debug!(
                    "Window of {} {} cut from {} to {max}",
                    moved.entity,
                    moved.location,
                    tracked.window
                );
                tracked.window = max;
            }
        }
        self.update_entity(&key.entity, new_name, aliases)?;
        Ok(SpawnKey::new(new_name, moved.location))
    }

    /// Capture everything needed to rebuild this tracker.
    pub fn snapshot(&self) -> TrackerSnapshot {
        let tracking = self
            .store
            .iter()
            .map(|(key, tracked)| TrackingRecord {
                entity: key.entity.clone(),
                location: key.location.clone(),
                tod: tracked.tod,
                window: tracked.window,
                pending: tracked
                    .pending
                    .iter()
                    .filter_map(|id| self.rules.position(*id))
                    .collect(),
            })
            .collect();
        TrackerSnapshot {
            alerts: self.rules.sources(),
            bosses: self.catalog.entities().clone(),
            tracking,
        }
    }

    /// Rebuild a tracker from a snapshot. Stored aliases are taken as-is.
    pub fn from_snapshot(snapshot: TrackerSnapshot) -> TrackerResult<Self> {
        let catalog = EntityCatalog::from_entities(snapshot.bosses, false)?;
        let mut tracker = Self::new(catalog);
        let mut ids = Vec::with_capacity(snapshot.alerts.len());
        for source in &snapshot.alerts {
            ids.push(tracker.rules.push(AlertRules::compile(source)?));
        }
        for record in snapshot.tracking {
            let key = SpawnKey::new(record.entity, record.location);
            if tracker.catalog.rule(&key).is_none() {
                tracing::warn!("Dropping stored observation of unknown spawn {}", key);
                continue;
            }
            let pending = record
                .pending
                .iter()
                .filter_map(|position| ids.get(*position).copied())
                .collect();
            tracker.store.insert(
                key,
                TrackedSpawn {
                    tod: record.tod,
                    window: record.window,
                    pending,
                },
            );
        }
        Ok(tracker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> Tracker {
        let mut catalog = EntityCatalog::new();
        catalog
            .insert_entity("Amon Ra", EntityConfig::single("Pyramid", SpawnRule { min: 60, max: 70 }), true)
            .unwrap();
        catalog
            .insert_entity("Atroce", EntityConfig::single("Valkyrie", SpawnRule { min: 240, max: 250 }), true)
            .unwrap();
        let mut spawns = BTreeMap::new();
        spawns.insert("Glast Heim".to_string(), SpawnRule { min: 60, max: 70 });
        spawns.insert("Britoniah".to_string(), SpawnRule { min: 480, max: 490 });
        catalog
            .insert_entity("Dark Lord", EntityConfig { aliases: Vec::new(), spawns }, true)
            .unwrap();
        Tracker::new(catalog)
    }

    fn amon() -> SpawnKey {
        SpawnKey::new("Amon Ra", "Pyramid")
    }

    fn atroce() -> SpawnKey {
        SpawnKey::new("Atroce", "Valkyrie")
    }

    #[test]
    fn test_track_and_signal() {
        let mut tracker = tracker();
        tracker.track(&amon(), 0.0, 0.0).unwrap();
        let signal = tracker.signal(&amon(), 70.0).unwrap();
        assert_eq!(signal.probability, 1.0);
        let rows = tracker.board_rows(70.0, 30);
        assert!(rows[0].status.contains("Ago"));

        tracker.track(&amon(), 0.0, 10.0).unwrap();
        let signal = tracker.signal(&amon(), 55.0).unwrap();
        assert!(signal.probability > 0.0 && signal.probability < 1.0);
    }

    #[test]
    fn test_track_then_cancel() {
        let mut tracker = tracker();
        tracker.add_rule("prob > 0.5", 0.0).unwrap();
        tracker.track(&amon(), 0.0, 0.0).unwrap();
        assert!(tracker.cancel(&amon()));
        assert!(tracker.signal(&amon(), 10.0).is_none());
        assert!(tracker.pending_positions(&amon()).is_none());
        assert!(!tracker.cancel(&amon()));
    }

    #[test]
    fn test_window_longer_than_max_rejected() {
        let mut tracker = tracker();
        let err = tracker.track(&amon(), 0.0, 71.0).unwrap_err();
        assert_eq!(err, TrackerError::WindowTooLong { max: 70 });
        assert!(!tracker.store().contains(&amon()));
    }

    #[test]
    fn test_unknown_window() {
        let mut tracker = tracker();
        assert_eq!(tracker.unknown_window(&amon(), 100.0).unwrap(), 70.0);
        tracker.track(&amon(), 0.0, 0.0).unwrap();
        // Earliest respawn was at 60; absence seen at 65 narrows it to 5.
        assert_eq!(tracker.unknown_window(&amon(), 65.0).unwrap(), 5.0);
        assert_eq!(tracker.unknown_window(&amon(), 500.0).unwrap(), 70.0);
        assert_eq!(tracker.unknown_window(&amon(), -5.0).unwrap(), 70.0);
        assert!(tracker.unknown_window(&amon(), 30.0).is_err());
    }

    #[test]
    fn test_rule_true_at_death_never_fires() {
        let mut tracker = tracker();
        tracker.add_rule("now >= 0", 0.0).unwrap();
        tracker.add_rule("prob > 0.5", 0.0).unwrap();
        tracker.track(&amon(), 0.0, 0.0).unwrap();
        let positions: Vec<_> = tracker.pending_positions(&amon()).unwrap().into_iter().collect();
        assert_eq!(positions, vec![1]);

        let fired = tracker.fire_alerts(66.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].rule, "prob > 0.5");
        assert_eq!(fired[0].label, "Amon Ra");
        assert!(tracker.fire_alerts(69.0).is_empty());

        tracker.track(&amon(), 100.0, 0.0).unwrap();
        assert_eq!(tracker.fire_alerts(166.0).len(), 1);
    }

    #[test]
    fn test_new_rule_not_armed_where_already_true() {
        let mut tracker = tracker();
        tracker.track(&amon(), 0.0, 0.0).unwrap();
        tracker.track(&atroce(), 0.0, 0.0).unwrap();
        tracker.add_rule("prob > 0.5", 100.0).unwrap();
        assert!(tracker.pending_positions(&amon()).unwrap().is_empty());
        assert_eq!(tracker.pending_positions(&atroce()).unwrap().len(), 1);
    }

    #[test]
    fn test_rule_removal_shifts_positions() {
        let mut tracker = tracker();
        for source in ["prob > 0.1", "prob > 0.2", "prob > 0.3", "prob > 0.4"] {
            tracker.add_rule(source, 0.0).unwrap();
        }
        tracker.track(&amon(), 0.0, 0.0).unwrap();
        let removed = tracker.remove_rule(1).unwrap();
        assert_eq!(removed, "prob > 0.2");
        let positions: Vec<_> = tracker.pending_positions(&amon()).unwrap().into_iter().collect();
        assert_eq!(positions, vec![0, 1, 2]);
        let fired = tracker.fire_alerts(63.5);
        let rules: Vec<_> = fired.iter().map(|f| f.rule.as_str()).collect();
        assert_eq!(rules, vec!["prob > 0.1", "prob > 0.3"]);
        assert!(tracker.remove_rule(5).is_err());
    }

    #[test]
    fn test_expiry_is_lazy() {
        let mut tracker = tracker();
        tracker.track(&amon(), 0.0, 0.0).unwrap();
        assert_eq!(tracker.display_order(140.0, 30).len(), 1);
        assert!(tracker.display_order(141.0, 30).is_empty());
        assert!(!tracker.store().contains(&amon()));

        tracker.track(&amon(), 0.0, 0.0).unwrap();
        assert_eq!(tracker.display_order(10_000.0, 0).len(), 1);
    }

    #[test]
    fn test_display_order() {
        let mut tracker = tracker();
        let glast = SpawnKey::new("Dark Lord", "Glast Heim");
        tracker.track(&atroce(), 0.0, 0.0).unwrap();
        tracker.track(&amon(), 0.0, 0.0).unwrap();
        tracker.track(&glast, -5.0, 0.0).unwrap();
        // At 65: Glast Heim (prob 1) first, Amon Ra (0.5), Atroce (0).
        assert_eq!(tracker.display_order(65.0, 0), vec![glast.clone(), amon(), atroce()]);
        // Glast Heim's max spawn time (65) is more than 30 minutes past at 100.
        tracker.track(&atroce(), -150.0, 0.0).unwrap();
        let order = tracker.display_order(100.0, 30);
        assert_eq!(order.last(), Some(&glast));
    }

    #[test]
    fn test_resolve_tracked() {
        let mut tracker = tracker();
        tracker.track(&SpawnKey::new("Dark Lord", "Glast Heim"), 0.0, 0.0).unwrap();
        assert_eq!(
            tracker.resolve_tracked("dl"),
            vec![SpawnKey::new("Dark Lord", "Glast Heim")]
        );
        assert!(tracker.resolve_tracked("atro").is_empty());
    }

    #[test]
    fn test_remove_spawn_cancels_tracking() {
        let mut tracker = tracker();
        tracker.track(&amon(), 0.0, 0.0).unwrap();
        let removed = tracker.remove_spawn(&amon()).unwrap();
        assert!(removed.was_tracked && removed.entity_removed);
        assert!(tracker.catalog().resolve("amon").is_empty());
        assert!(tracker.store().is_empty());
    }

    #[test]
    fn test_rename_keeps_observation() {
        let mut tracker = tracker();
        tracker.add_rule("prob > 0.5", 0.0).unwrap();
        tracker.track(&amon(), 0.0, 0.0).unwrap();
        tracker
            .update_entity("Amon Ra", "Amon Re", BTreeSet::new())
            .unwrap();
        let renamed = SpawnKey::new("Amon Re", "Pyramid");
        assert!(tracker.store().contains(&renamed));
        assert_eq!(tracker.pending_positions(&renamed).unwrap().len(), 1);
    }

    #[test]
    fn test_update_spawn_validates_first() {
        let mut tracker = tracker();
        let glast = SpawnKey::new("Dark Lord", "Glast Heim");
        tracker.track(&glast, 0.0, 0.0).unwrap();
        let err = tracker
            .update_spawn(&glast, "Atroce", "GH", SpawnRule { min: 1, max: 2 }, BTreeSet::new())
            .unwrap_err();
        assert_eq!(err, TrackerError::DuplicateName("Atroce".into()));
        assert_eq!(tracker.catalog().rule(&glast), Some(SpawnRule { min: 60, max: 70 }));

        let moved = tracker
            .update_spawn(&glast, "Dark Lord", "GH", SpawnRule { min: 50, max: 60 }, BTreeSet::new())
            .unwrap();
        assert_eq!(moved, SpawnKey::new("Dark Lord", "GH"));
        assert!(tracker.store().contains(&moved));
    }

    #[test]
    fn test_shorter_max_cuts_tracked_window() {
        let mut tracker = tracker();
        tracker.track(&amon(), 0.0, 65.0).unwrap();
        let key = tracker
            .update_spawn(&amon(), "Amon Ra", "Pyramid", SpawnRule { min: 10, max: 20 }, BTreeSet::new())
            .unwrap();
        assert_eq!(tracker.store().get(&key).unwrap().window, 20.0);
        let signal = tracker.signal(&key, 20.0).unwrap();
        assert_eq!(signal.min_time, 0.0);
        assert_eq!(signal.max_time, 20.0);

        tracker
            .update_spawn(&key, "Amon Ra", "Pyramid", SpawnRule { min: 60, max: 70 }, BTreeSet::new())
            .unwrap();
        assert_eq!(tracker.store().get(&key).unwrap().window, 20.0);
    }

    #[test]
    fn test_snapshot_restores_pending_positions() {
        let mut tracker = tracker();
        tracker.add_rule("prob > 0.1", 0.0).unwrap();
        tracker.add_rule("prob > 0.9", 0.0).unwrap();
        tracker.track(&amon(), 0.0, 0.0).unwrap();
        tracker.fire_alerts(62.0);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.tracking[0].pending, vec![1]);

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored = Tracker::from_snapshot(serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(restored.rules().sources(), vec!["prob > 0.1", "prob > 0.9"]);
        let positions: Vec<_> = restored.pending_positions(&amon()).unwrap().into_iter().collect();
        assert_eq!(positions, vec![1]);
        assert_eq!(restored.catalog().len(), 3);
    }
}
