//! The in-memory state of one tracking group.

use tokio::task::JoinHandle;

use spawnwatch::{DisambiguationBroker, Tracker, TrackerResult};

use crate::commands::continuation::{ChoiceValue, PendingOperation};
use crate::config::GroupConfig;
use crate::gateway::MessagingGateway;
use crate::storage::GroupSnapshot;
use crate::types::{ChannelRef, MessageHandle, RoleRef};

/// Pending prompts of a group, keyed by user id.
pub type Prompts = DisambiguationBroker<u64, ChoiceValue, PendingOperation>;

/// Everything a group owns. Only touched while holding the group's lock.
pub struct GroupSession {
    id: u64,
    pub tracker: Tracker,
    pub config: GroupConfig,
    pub prompts: Prompts,
    /// Session clock (minutes) of the last board refresh.
    pub refresh_time: f64,
    /// Session clock (minutes) at which the command being handled was sent.
    pub send_time: f64,
    channel_cache: Option<ChannelRef>,
    role_cache: Option<RoleRef>,
    refresh_task: Option<JoinHandle<()>>,
}

impl GroupSession {
    pub fn new(id: u64, tracker: Tracker, config: GroupConfig, now: f64) -> Self {
        Self {
            id,
            tracker,
            config,
            prompts: Prompts::new(),
            refresh_time: now,
            send_time: now,
            channel_cache: None,
            role_cache: None,
            refresh_task: None,
        }
    }

    /// Rebuild a group from its stored snapshot.
    pub fn from_snapshot(id: u64, snapshot: GroupSnapshot, now: f64) -> TrackerResult<Self> {
        let tracker = Tracker::from_snapshot(snapshot.tracker)?;
        Ok(Self::new(id, tracker, snapshot.config, now))
    }

    pub fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            config: self.config.clone(),
            tracker: self.tracker.snapshot(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether `user` is a configured editor. Group managers are editors
    /// too; that is checked against the gateway by the caller.
    pub fn is_listed_editor(&self, user: u64) -> bool {
        self.config.editors.contains(&user)
    }

    /// Ask `user` to pick one of `options` before `operation` can go on.
    pub fn prompt(
        &mut self,
        user: u64,
        message: &str,
        options: Vec<(String, ChoiceValue)>,
        operation: PendingOperation,
        sort: bool,
    ) -> String {
        self.prompts.prompt(user, message, options, operation, sort)
    }

    /// The board channel, resolved once and cached until it is changed.
    pub async fn channel(&mut self, gateway: &dyn MessagingGateway) -> Option<ChannelRef> {
        let id = self.config.channel?;
        if let Some(cached) = self.channel_cache.as_ref().filter(|c| c.id == id) {
            return Some(cached.clone());
        }
        let resolved = gateway.resolve_channel(id).await;
        if resolved.is_none() {
            tracing::warn!("Board channel {id} of group {} could not be resolved", self.id);
        }
        self.channel_cache = resolved.clone();
        resolved
    }

    /// Point the board at a new channel. Messages in the old one are no
    /// longer ours to edit.
    pub fn set_channel(&mut self, channel: u64) {
        self.config.channel = Some(channel);
        self.config.messages.clear();
        self.channel_cache = None;
    }

    /// The role mentioned with alerts, resolved once and cached.
    pub async fn alert_role(&mut self, gateway: &dyn MessagingGateway) -> Option<RoleRef> {
        let id = self.config.alert_role?;
        if let Some(cached) = self.role_cache.as_ref().filter(|r| r.id == id) {
            return Some(cached.clone());
        }
        let resolved = gateway.resolve_role(self.id, id).await;
        self.role_cache = resolved.clone();
        resolved
    }

    pub fn set_alert_role(&mut self, role: u64) {
        self.config.alert_role = Some(role);
        self.role_cache = None;
    }

    /// Handles of the board messages, in page order.
    pub fn board_messages(&self) -> Vec<MessageHandle> {
        match self.config.channel {
            Some(channel) => self
                .config
                .messages
                .iter()
                .map(|&id| MessageHandle { channel, id })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Install a new periodic refresh task, aborting the previous one.
    pub fn set_refresh_task(&mut self, task: Option<JoinHandle<()>>) {
        if let Some(previous) = std::mem::replace(&mut self.refresh_task, task) {
            previous.abort();
            tracing::info!("Cancelled auto-refresh of group {}", self.id);
        }
    }

    pub fn has_refresh_task(&self) -> bool {
        self.refresh_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for GroupSession {
    fn drop(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
    }
}
