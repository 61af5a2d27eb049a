//! Configuration loading and resolution.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use spawnwatch::format::{minutes_to_hhmm, quantity};

/// Environment variable naming the state document.
pub const STATE_ENV: &str = "SPAWNWATCH_STATE";

/// Resolve the state document path.
pub fn resolve_state_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var(STATE_ENV) {
        return env_path;
    }

    let cwd_state = PathBuf::from(".spawnwatch/state.json");
    if cwd_state.exists() {
        return cwd_state.display().to_string();
    }

    resolve_default_state_path()
}

fn resolve_default_state_path() -> String {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    format!("{home}/.spawnwatch/state.json")
}

/// Settings of one tracking group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GroupConfig {
    pub editors: Vec<u64>,
    /// Minutes between automatic board refreshes; 0 disables them.
    pub auto_refresh: u32,
    /// Minutes after which stale observations are dropped; 0 disables expiry.
    pub expire: u32,
    /// Server clock offset from UTC in minutes.
    pub utc_offset: i64,
    pub channel: Option<u64>,
    pub alert_role: Option<u64>,
    /// Ids of the board messages in `channel`, in page order.
    pub messages: Vec<u64>,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            editors: Vec::new(),
            auto_refresh: 1,
            expire: 30,
            utc_offset: 0,
            channel: None,
            alert_role: None,
            messages: Vec::new(),
        }
    }
}

impl GroupConfig {
    pub fn auto_refresh_label(&self) -> String {
        match self.auto_refresh {
            0 => "unset".to_string(),
            minutes => quantity("minute", i64::from(minutes)),
        }
    }

    pub fn expire_label(&self) -> String {
        match self.expire {
            0 => "unset".to_string(),
            minutes => quantity("minute", i64::from(minutes)),
        }
    }

    pub fn utc_offset_label(&self) -> String {
        minutes_to_hhmm(self.utc_offset)
    }

    pub fn channel_label(&self) -> String {
        match self.channel {
            Some(id) => format!("<#{id}>"),
            None => "unset".to_string(),
        }
    }
}
