//! Registry of group sessions, loaded from the state document at startup and
//! created from the default catalog on first contact.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;

use spawnwatch::{default_catalog, Tracker};

use super::GroupSession;
use crate::config::GroupConfig;
use crate::storage::StateStore;
use crate::types::{BotError, BotResult};

/// A group session behind its command lock.
pub type SharedSession = Arc<Mutex<GroupSession>>;

pub struct GroupRegistry {
    store: StateStore,
    sessions: StdMutex<BTreeMap<u64, SharedSession>>,
}

impl GroupRegistry {
    /// Open the state document and rebuild every stored group.
    pub fn open(path: impl Into<PathBuf>, now: f64) -> BotResult<Self> {
        let store = StateStore::open(path)?;
        let mut sessions = BTreeMap::new();
        for (id, snapshot) in store.groups()? {
            let session = GroupSession::from_snapshot(id, snapshot, now).map_err(|e| {
                BotError::Persistence(format!("Stored state of group {id} is invalid: {e}"))
            })?;
            tracing::info!(
                "Loaded group {id}: {} bosses, {} tracked",
                session.tracker.catalog().len(),
                session.tracker.store().len()
            );
            sessions.insert(id, Arc::new(Mutex::new(session)));
        }
        Ok(Self {
            store,
            sessions: StdMutex::new(sessions),
        })
    }

    fn sessions(&self) -> BotResult<std::sync::MutexGuard<'_, BTreeMap<u64, SharedSession>>> {
        self.sessions
            .lock()
            .map_err(|e| BotError::Internal(format!("Registry lock poisoned: {e}")))
    }

    pub fn get(&self, group: u64) -> BotResult<Option<SharedSession>> {
        Ok(self.sessions()?.get(&group).cloned())
    }

    /// Get a group's session, creating it from the default catalog on first
    /// access. The flag tells whether it was just created.
    pub fn get_or_create(&self, group: u64, now: f64) -> BotResult<(SharedSession, bool)> {
        let mut sessions = self.sessions()?;
        if let Some(session) = sessions.get(&group) {
            return Ok((session.clone(), false));
        }

        let tracker = Tracker::new(default_catalog()?);
        let session = GroupSession::new(group, tracker, GroupConfig::default(), now);
        tracing::info!("Created group {group} from the default catalog");
        let session = Arc::new(Mutex::new(session));
        sessions.insert(group, session.clone());
        Ok((session, true))
    }

    /// Every known group, by id.
    pub fn all(&self) -> BotResult<Vec<(u64, SharedSession)>> {
        Ok(self
            .sessions()?
            .iter()
            .map(|(id, session)| (*id, session.clone()))
            .collect())
    }

    pub fn count(&self) -> usize {
        self.sessions().map(|s| s.len()).unwrap_or(0)
    }

    /// Write the group's current state. Callers hold the group's lock.
    pub fn persist(&self, session: &GroupSession) -> BotResult<()> {
        self.store.save_group(session.id(), session.snapshot())
    }

    pub fn state_path(&self) -> &std::path::Path {
        self.store.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_seeds_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let registry = GroupRegistry::open(dir.path().join("state.json"), 0.0).unwrap();
        let (first, created) = registry.get_or_create(9, 0.0).unwrap();
        assert!(created);
        let (second, created) = registry.get_or_create(9, 0.0).unwrap();
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!first.lock().await.tracker.catalog().is_empty());
        assert_eq!(registry.count(), 1);
    }

    #[tokio::test]
    async fn test_persisted_groups_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        {
            let registry = GroupRegistry::open(&path, 0.0).unwrap();
            let (session, _) = registry.get_or_create(3, 0.0).unwrap();
            let mut session = session.lock().await;
            session.config.utc_offset = 120;
            registry.persist(&session).unwrap();
        }
        let registry = GroupRegistry::open(&path, 0.0).unwrap();
        let session = registry.get(3).unwrap().unwrap();
        assert_eq!(session.lock().await.config.utc_offset, 120);
        assert!(registry.get(4).unwrap().is_none());
    }
}
