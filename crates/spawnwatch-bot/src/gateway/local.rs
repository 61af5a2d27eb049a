//! In-process gateway: keeps channel histories in memory and reports every
//! outbound action, either to a channel (for the JSON-lines transport) or to
//! an in-memory log.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use super::{
    parse_mention, MentionKind, MessagingGateway, BULK_DELETE_LIMIT, BULK_DELETE_MAX_AGE_SECS,
};
use crate::types::{
    BotError, BotResult, ChannelRef, Content, InboundMessage, MessageHandle, MessageInfo, RoleRef,
};

/// Author id of messages posted by the bot itself.
pub const BOT_USER_ID: u64 = 0;

/// Something the bot did, as reported by the local gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OutboundAction {
    Send {
        channel: u64,
        id: u64,
        content: Content,
    },
    Edit {
        channel: u64,
        id: u64,
        content: Content,
    },
    Delete {
        channel: u64,
        id: u64,
    },
    BulkDelete {
        channel: u64,
        ids: Vec<u64>,
    },
}

#[derive(Debug, Clone)]
struct StoredMessage {
    id: u64,
    author: u64,
    created_at: DateTime<Utc>,
    content: Content,
}

#[derive(Debug, Default)]
struct LocalState {
    /// Oldest first.
    channels: HashMap<u64, Vec<StoredMessage>>,
    managers: HashSet<(u64, u64)>,
    next_id: u64,
    clock: Option<DateTime<Utc>>,
    actions: Vec<OutboundAction>,
}

impl LocalState {
    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn find_mut(&mut self, handle: &MessageHandle) -> BotResult<&mut StoredMessage> {
        self.channels
            .get_mut(&handle.channel)
            .and_then(|messages| messages.iter_mut().find(|m| m.id == handle.id))
            .ok_or_else(|| BotError::Gateway(format!("Unknown message {}", handle.id)))
    }

    fn remove(&mut self, handle: &MessageHandle) -> BotResult<()> {
        let messages = self
            .channels
            .get_mut(&handle.channel)
            .ok_or_else(|| BotError::Gateway(format!("Unknown channel {}", handle.channel)))?;
        let before = messages.len();
        messages.retain(|m| m.id != handle.id);
        if messages.len() == before {
            return Err(BotError::Gateway(format!("Unknown message {}", handle.id)));
        }
        Ok(())
    }
}

/// A gateway with no external service behind it.
#[derive(Debug, Default)]
pub struct LocalGateway {
    state: Mutex<LocalState>,
    sink: Option<UnboundedSender<OutboundAction>>,
}

impl LocalGateway {
    /// A gateway that logs actions in memory; see [`LocalGateway::actions`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that forwards every action to `sink`.
    pub fn with_sink(sink: UnboundedSender<OutboundAction>) -> Self {
        Self {
            state: Mutex::default(),
            sink: Some(sink),
        }
    }

    fn state(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, state: &mut LocalState, action: OutboundAction) {
        match &self.sink {
            Some(sink) => {
                if sink.send(action).is_err() {
                    tracing::debug!("Action sink closed, dropping action");
                }
            }
            None => state.actions.push(action),
        }
    }

    /// Freeze the clock at `at`.
    pub fn set_time(&self, at: DateTime<Utc>) {
        self.state().clock = Some(at);
    }

    /// Move a frozen clock forward. Starts from the real time if unfrozen.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state();
        let now = state.now();
        state.clock = Some(now + by);
    }

    pub fn grant_manage(&self, group: u64, user: u64) {
        self.state().managers.insert((group, user));
    }

    /// Store an inbound message in its channel's history.
    pub fn record_inbound(&self, message: &InboundMessage) -> MessageHandle {
        let mut state = self.state();
        if message.author.manage_group {
            state.managers.insert((message.group, message.author.id));
        }
        let id = state.allocate_id();
        state
            .channels
            .entry(message.channel)
            .or_default()
            .push(StoredMessage {
                id,
                author: message.author.id,
                created_at: message.timestamp,
                content: Content::text(message.content.clone()),
            });
        MessageHandle {
            channel: message.channel,
            id,
        }
    }

    /// Current messages of a channel, oldest first.
    pub fn messages(&self, channel: u64) -> Vec<(MessageHandle, Content)> {
        self.state()
            .channels
            .get(&channel)
            .map(|messages| {
                messages
                    .iter()
                    .map(|m| (MessageHandle { channel, id: m.id }, m.content.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Actions logged so far (in-memory mode only).
    pub fn actions(&self) -> Vec<OutboundAction> {
        self.state().actions.clone()
    }

    pub fn take_actions(&self) -> Vec<OutboundAction> {
        std::mem::take(&mut self.state().actions)
    }
}

#[async_trait]
impl MessagingGateway for LocalGateway {
    async fn send_message(&self, channel: u64, content: Content) -> BotResult<MessageHandle> {
        let mut state = self.state();
        let id = state.allocate_id();
        let created_at = state.now();
        state.channels.entry(channel).or_default().push(StoredMessage {
            id,
            author: BOT_USER_ID,
            created_at,
            content: content.clone(),
        });
        self.emit(
            &mut state,
            OutboundAction::Send {
                channel,
                id,
                content,
            },
        );
        Ok(MessageHandle { channel, id })
    }

    async fn edit_message(&self, handle: &MessageHandle, content: Content) -> BotResult<()> {
        let mut state = self.state();
        let message = state.find_mut(handle)?;
        if message.author != BOT_USER_ID {
            return Err(BotError::Gateway(format!(
                "Cannot edit message {} from another author",
                handle.id
            )));
        }
        message.content = content.clone();
        self.emit(
            &mut state,
            OutboundAction::Edit {
                channel: handle.channel,
                id: handle.id,
                content,
            },
        );
        Ok(())
    }

    async fn delete_message(&self, handle: &MessageHandle) -> BotResult<()> {
        let mut state = self.state();
        state.remove(handle)?;
        self.emit(
            &mut state,
            OutboundAction::Delete {
                channel: handle.channel,
                id: handle.id,
            },
        );
        Ok(())
    }

    async fn bulk_delete_messages(&self, channel: u64, handles: &[MessageHandle]) -> BotResult<()> {
        if handles.len() > BULK_DELETE_LIMIT {
            return Err(BotError::Gateway(format!(
                "Bulk delete of {} messages exceeds the limit of {BULK_DELETE_LIMIT}",
                handles.len()
            )));
        }
        let mut state = self.state();
        let cutoff = state.now() - Duration::seconds(BULK_DELETE_MAX_AGE_SECS);
        let messages = state
            .channels
            .get(&channel)
            .ok_or_else(|| BotError::Gateway(format!("Unknown channel {channel}")))?;
        for handle in handles {
            let message = messages
                .iter()
                .find(|m| m.id == handle.id && handle.channel == channel)
                .ok_or_else(|| BotError::Gateway(format!("Unknown message {}", handle.id)))?;
            if message.created_at <= cutoff {
                return Err(BotError::Gateway(format!(
                    "Message {} is too old to bulk delete",
                    handle.id
                )));
            }
        }
        for handle in handles {
            state.remove(handle)?;
        }
        self.emit(
            &mut state,
            OutboundAction::BulkDelete {
                channel,
                ids: handles.iter().map(|h| h.id).collect(),
            },
        );
        Ok(())
    }

    async fn channel_history(&self, channel: u64) -> BotResult<Vec<MessageInfo>> {
        let state = self.state();
        Ok(state
            .channels
            .get(&channel)
            .map(|messages| {
                messages
                    .iter()
                    .rev()
                    .map(|m| MessageInfo {
                        handle: MessageHandle { channel, id: m.id },
                        author: m.author,
                        created_at: m.created_at,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn resolve_mention(&self, _group: u64, token: &str, kind: MentionKind) -> Option<u64> {
        parse_mention(token, kind)
    }

    async fn resolve_channel(&self, channel: u64) -> Option<ChannelRef> {
        Some(ChannelRef {
            id: channel,
            mention: format!("<#{channel}>"),
        })
    }

    async fn resolve_role(&self, _group: u64, role: u64) -> Option<RoleRef> {
        Some(RoleRef {
            id: role,
            mention: format!("<@&{role}>"),
        })
    }

    async fn has_manage_permission(&self, group: u64, user: u64) -> bool {
        self.state().managers.contains(&(group, user))
    }

    fn current_timestamp(&self) -> DateTime<Utc> {
        self.state().now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Author;

    fn inbound(channel: u64, content: &str) -> InboundMessage {
        InboundMessage {
            group: 1,
            channel,
            author: Author {
                id: 5,
                name: "user".into(),
                manage_group: true,
            },
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_send_edit_delete() {
        let gateway = LocalGateway::new();
        let handle = gateway.send_message(3, Content::text("a")).await.unwrap();
        gateway.edit_message(&handle, Content::text("b")).await.unwrap();
        assert_eq!(gateway.messages(3), vec![(handle, Content::text("b"))]);
        gateway.delete_message(&handle).await.unwrap();
        assert!(gateway.messages(3).is_empty());
        assert_eq!(gateway.actions().len(), 3);
        assert!(gateway.delete_message(&handle).await.is_err());
    }

    #[tokio::test]
    async fn test_cannot_edit_user_messages() {
        let gateway = LocalGateway::new();
        let handle = gateway.record_inbound(&inbound(3, "!t"));
        assert!(gateway.edit_message(&handle, Content::text("x")).await.is_err());
        assert!(gateway.has_manage_permission(1, 5).await);
        assert!(!gateway.has_manage_permission(2, 5).await);
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let gateway = LocalGateway::new();
        let first = gateway.send_message(3, Content::text("1")).await.unwrap();
        let second = gateway.send_message(3, Content::text("2")).await.unwrap();
        let history = gateway.channel_history(3).await.unwrap();
        assert_eq!(history[0].handle, second);
        assert_eq!(history[1].handle, first);
    }

    #[tokio::test]
    async fn test_bulk_delete_rejects_old_messages() {
        let gateway = LocalGateway::new();
        let start = Utc::now();
        gateway.set_time(start);
        let old = gateway.send_message(3, Content::text("old")).await.unwrap();
        gateway.advance(Duration::days(15));
        let new = gateway.send_message(3, Content::text("new")).await.unwrap();
        assert!(gateway.bulk_delete_messages(3, &[old, new]).await.is_err());
        assert_eq!(gateway.messages(3).len(), 2);
        gateway.bulk_delete_messages(3, &[new]).await.unwrap();
        assert_eq!(gateway.messages(3).len(), 1);
    }

    #[tokio::test]
    async fn test_sink_receives_actions() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let gateway = LocalGateway::with_sink(tx);
        gateway.send_message(3, Content::text("hi")).await.unwrap();
        assert!(gateway.actions().is_empty());
        match rx.recv().await.unwrap() {
            OutboundAction::Send { channel, .. } => assert_eq!(channel, 3),
            other => panic!("unexpected {other:?}"),
        }
    }
}
