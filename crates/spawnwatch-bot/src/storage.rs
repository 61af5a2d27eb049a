//! The state document: every group's configuration, catalog and live
//! observations in one JSON file, rewritten whole after each change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use spawnwatch::TrackerSnapshot;

use crate::config::GroupConfig;
use crate::types::{BotError, BotResult};

/// Everything persisted for one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    #[serde(default)]
    pub config: GroupConfig,
    #[serde(flatten)]
    pub tracker: TrackerSnapshot,
}

/// Group id → snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateDocument {
    pub groups: BTreeMap<u64, GroupSnapshot>,
}

impl StateDocument {
    /// Read a document. A missing file is an empty document.
    pub fn load(path: &Path) -> BotResult<Self> {
        if !path.exists() {
            tracing::info!("No state file at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&data).map_err(|e| {
            BotError::Persistence(format!("Invalid state file {}: {e}", path.display()))
        })
    }

    /// Write the document atomically: a sibling temp file renamed into place.
    pub fn save(&self, path: &Path) -> BotResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// The on-disk document plus a cache of the last snapshot of each group, so
/// one group can be saved without locking the others.
pub struct StateStore {
    path: PathBuf,
    document: Mutex<StateDocument>,
}

impl StateStore {
    pub fn open(path: impl Into<PathBuf>) -> BotResult<Self> {
        let path = path.into();
        let document = StateDocument::load(&path)?;
        tracing::info!(
            "Loaded state for {} group(s) from {}",
            document.groups.len(),
            path.display()
        );
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshots as loaded or last saved.
    pub fn groups(&self) -> BotResult<BTreeMap<u64, GroupSnapshot>> {
        let document = self
            .document
            .lock()
            .map_err(|e| BotError::Internal(format!("State lock poisoned: {e}")))?;
        Ok(document.groups.clone())
    }

    /// Replace one group's snapshot and rewrite the whole document.
    pub fn save_group(&self, group: u64, snapshot: GroupSnapshot) -> BotResult<()> {
        let mut document = self
            .document
            .lock()
            .map_err(|e| BotError::Internal(format!("State lock poisoned: {e}")))?;
        document.groups.insert(group, snapshot);
        document.save(&self.path).map_err(|e| {
            tracing::error!("Failed to save {}: {e}", self.path.display());
            BotError::Persistence(e.to_string())
        })?;
        tracing::debug!("Saved state file: {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let doc = StateDocument::load(&dir.path().join("none.json")).unwrap();
        assert!(doc.groups.is_empty());
    }

    #[test]
    fn test_group_keys_and_flattened_tracker() {
        let mut doc = StateDocument::default();
        let mut snapshot = GroupSnapshot::default();
        snapshot.tracker.alerts.push("prob > 0.5".into());
        doc.groups.insert(42, snapshot);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["42"]["alerts"][0], "prob > 0.5");
        assert_eq!(value["42"]["config"]["expire"], 30);
    }

    #[test]
    fn test_save_group_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let store = StateStore::open(&path).unwrap();
        let mut snapshot = GroupSnapshot::default();
        snapshot.config.expire = 5;
        store.save_group(1, snapshot.clone()).unwrap();
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());

        let reopened = StateStore::open(&path).unwrap();
        assert_eq!(reopened.groups().unwrap().get(&1), Some(&snapshot));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            StateDocument::load(&path),
            Err(BotError::Persistence(_))
        ));
    }
}
