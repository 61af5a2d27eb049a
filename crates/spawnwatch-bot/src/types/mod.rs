//! Types shared across the bot: errors and the message model.

pub mod error;
pub mod message;

pub use error::{BotError, BotResult, RejectAs};
pub use message::*;
