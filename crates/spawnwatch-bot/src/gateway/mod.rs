//! Messaging gateway abstraction.
//!
//! Everything the bot does to a chat service goes through the
//! `MessagingGateway` trait; `LocalGateway` is the in-process implementation
//! behind the JSON-lines transport, the REPL and the tests.

pub mod local;

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;

use crate::types::{BotResult, ChannelRef, Content, MessageHandle, MessageInfo, RoleRef};

pub use local::{LocalGateway, OutboundAction};

/// Most messages one bulk delete may remove.
pub const BULK_DELETE_LIMIT: usize = 100;
/// Bulk deletion only applies to messages younger than this many seconds.
pub const BULK_DELETE_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;
/// Messages this close to the bulk age limit are deleted one by one.
pub const BULK_DELETE_GRACE_SECS: i64 = 300;

/// What a mention token refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKind {
    Channel,
    Role,
    User,
}

fn mention_regex(kind: MentionKind) -> &'static Regex {
    static CHANNEL: OnceLock<Regex> = OnceLock::new();
    static ROLE: OnceLock<Regex> = OnceLock::new();
    static USER: OnceLock<Regex> = OnceLock::new();
    match kind {
        MentionKind::Channel => {
            CHANNEL.get_or_init(|| Regex::new(r"^<#(\d+)>$").expect("channel regex is valid"))
        }
        MentionKind::Role => {
            ROLE.get_or_init(|| Regex::new(r"^<@&(\d+)>$").expect("role regex is valid"))
        }
        MentionKind::User => {
            USER.get_or_init(|| Regex::new(r"^<@!?(\d+)>$").expect("user regex is valid"))
        }
    }
}

/// Extract the id from a mention token of the given kind.
pub fn parse_mention(token: &str, kind: MentionKind) -> Option<u64> {
    let captures = mention_regex(kind).captures(token)?;
    captures.get(1)?.as_str().parse().ok()
}

/// The chat service, as seen by the bot.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Post a message and return its handle.
    async fn send_message(&self, channel: u64, content: Content) -> BotResult<MessageHandle>;

    /// Replace the content of a message the bot posted.
    async fn edit_message(&self, handle: &MessageHandle, content: Content) -> BotResult<()>;

    async fn delete_message(&self, handle: &MessageHandle) -> BotResult<()>;

    /// Delete up to [`BULK_DELETE_LIMIT`] messages of one channel at once.
    /// Only valid for messages younger than [`BULK_DELETE_MAX_AGE_SECS`].
    async fn bulk_delete_messages(&self, channel: u64, handles: &[MessageHandle]) -> BotResult<()>;

    /// Every message of a channel, newest first.
    async fn channel_history(&self, channel: u64) -> BotResult<Vec<MessageInfo>>;

    /// Resolve a mention token to the id it refers to.
    async fn resolve_mention(&self, group: u64, token: &str, kind: MentionKind) -> Option<u64>;

    /// Look up a channel by id.
    async fn resolve_channel(&self, channel: u64) -> Option<ChannelRef>;

    /// Look up a role of a group by id.
    async fn resolve_role(&self, group: u64, role: u64) -> Option<RoleRef>;

    /// Whether a user may manage the group.
    async fn has_manage_permission(&self, group: u64, user: u64) -> bool;

    fn current_timestamp(&self) -> DateTime<Utc>;
}
