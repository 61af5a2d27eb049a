//! Inbound chat events and outbound message content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use spawnwatch::paginator::{Field, Page, BLANK_TITLE};

/// Identity of a message the bot can later edit or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    pub channel: u64,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
    /// The author holds the group-management permission.
    #[serde(default)]
    pub manage_group: bool,
}

/// A chat message received from a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub group: u64,
    pub channel: u64,
    pub author: Author,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// A titled field of a rich message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichField {
    pub name: String,
    pub value: String,
}

impl From<Field> for RichField {
    fn from(field: Field) -> Self {
        Self {
            name: field.title,
            value: field.body,
        }
    }
}

/// What a message carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text { text: String },
    Rich { fields: Vec<RichField> },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    pub fn rich(fields: Vec<Field>) -> Self {
        Content::Rich {
            fields: fields.into_iter().map(RichField::from).collect(),
        }
    }

    /// A board page rendered as rich content.
    pub fn page(page: &Page) -> Self {
        Content::rich(page.fields())
    }

    /// A blank rich message, sent to reserve a board slot before it is
    /// edited with its page.
    pub fn placeholder() -> Self {
        Content::Rich {
            fields: vec![RichField {
                name: BLANK_TITLE.to_string(),
                value: BLANK_TITLE.to_string(),
            }],
        }
    }
}

/// A message as seen in a channel's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub handle: MessageHandle,
    pub author: u64,
    pub created_at: DateTime<Utc>,
}

/// A resolved channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: u64,
    pub mention: String,
}

/// A resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    pub id: u64,
    pub mention: String,
}
