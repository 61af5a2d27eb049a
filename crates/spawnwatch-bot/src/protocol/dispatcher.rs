//! Main message dispatcher: receives chat messages, routes them to command
//! handlers or pending prompts, and posts the replies.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use spawnwatch::format::session_minutes;
use spawnwatch::paginator::{chunk_message, MESSAGE_CAPACITY};
use spawnwatch::parse_selection;

use crate::commands::continuation;
use crate::commands::{CommandContext, CommandRegistry};
use crate::gateway::local::BOT_USER_ID;
use crate::scheduler;
use crate::services::Services;
use crate::session::{GroupSession, SharedSession};
use crate::types::{BotError, BotResult, Content, InboundMessage};

/// Reply sent when a command handler panics.
pub const UNEXPECTED_FAILURE: &str = "Error: command failed unexpectedly";

/// A command as typed: canonical name and whitespace-separated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// Parse `!name args...`. Names are case-insensitive.
pub fn parse_command(content: &str) -> Option<ParsedCommand> {
    let mut words = content.split_whitespace();
    let word = words.next()?.strip_prefix('!')?;
    if word.is_empty() {
        return None;
    }
    Some(ParsedCommand {
        name: CommandRegistry::canonical_name(&word.to_lowercase()),
        args: words.map(str::to_string).collect(),
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Routes chat messages of every group.
#[derive(Clone)]
pub struct Dispatcher {
    services: Services,
}

impl Dispatcher {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Handle one inbound message and return the reply messages that were
    /// posted to its channel.
    pub async fn handle_message(&self, message: &InboundMessage) -> BotResult<Vec<String>> {
        let content = message.content.trim();
        if message.author.id == BOT_USER_ID || content.is_empty() {
            return Ok(Vec::new());
        }
        let sent = session_minutes(message.timestamp);
        let (shared, created) = if parse_command(content).is_some() {
            self.services.registry.get_or_create(message.group, sent)?
        } else if parse_selection(content).is_some() {
            // Selections only answer prompts, which only exist in known groups.
            match self.services.registry.get(message.group)? {
                Some(shared) => (shared, false),
                None => return Ok(Vec::new()),
            }
        } else {
            return Ok(Vec::new());
        };
        let mut group = shared.lock().await;
        if created && group.config.auto_refresh > 0 {
            let task = scheduler::spawn_refresh_loop(self.services.clone(), shared.clone());
            group.set_refresh_task(Some(task));
        }
        group.send_time = sent;

        let outcome = AssertUnwindSafe(self.dispatch(&mut group, &shared, message))
            .catch_unwind()
            .await;
        let reply = match outcome {
            Ok(Ok(None)) => return Ok(Vec::new()),
            Ok(Ok(Some(reply))) => reply,
            Ok(Err(e)) if e.is_rejection() => {
                tracing::debug!("Rejected in group {}: {e}", message.group);
                e.to_string()
            }
            Ok(Err(e)) => {
                tracing::error!("Command failed in group {}: {e}", message.group);
                format!("Error: {e}")
            }
            Err(panic) => {
                tracing::error!(
                    "Command {:?} panicked in group {}: {}",
                    message.content,
                    message.group,
                    panic_message(&*panic)
                );
                return self.reply(message.channel, UNEXPECTED_FAILURE).await;
            }
        };

        match self.services.registry.persist(&group) {
            Ok(()) => tracing::debug!("Saved group {}", message.group),
            Err(e) => tracing::error!("Failed to save group {}: {e}", message.group),
        }
        self.reply(message.channel, &reply).await
    }

    /// Route a message to the author's pending prompt or to a command.
    /// `None` means the message was not for the bot.
    async fn dispatch(
        &self,
        group: &mut GroupSession,
        shared: &SharedSession,
        message: &InboundMessage,
    ) -> BotResult<Option<String>> {
        let author = &message.author;
        let content = message.content.trim();

        if group.prompts.is_awaiting(&author.id) {
            if let Some(selection) = parse_selection(content) {
                let Some(resumption) = group.prompts.choose(&author.id, &selection) else {
                    tracing::debug!("Ignoring selection {content:?} from {}", author.name);
                    return Ok(None);
                };
                let mut ctx = CommandContext {
                    session: group,
                    shared,
                    services: &self.services,
                    author,
                };
                return continuation::resume(&mut ctx, resumption).await.map(Some);
            }
        }

        let Some(ParsedCommand { name, args }) = parse_command(content) else {
            return Ok(None);
        };
        let Some(definition) = CommandRegistry::definition(&name) else {
            tracing::debug!("Ignoring unknown command !{name}");
            return Ok(None);
        };

        let mut ctx = CommandContext {
            session: group,
            shared,
            services: &self.services,
            author,
        };
        if definition.access.requires_editor(!args.is_empty()) && !ctx.is_editor(author.id).await {
            return Err(BotError::PermissionDenied {
                command: name,
                user: author.name.clone(),
            });
        }
        tracing::debug!(
            "Group {}: {} runs !{name} {}",
            message.group,
            author.name,
            args.join(" ")
        );
        CommandRegistry::call(&name, &args, &mut ctx).await.map(Some)
    }

    async fn reply(&self, channel: u64, text: &str) -> BotResult<Vec<String>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let chunks = chunk_message(text, MESSAGE_CAPACITY);
        for chunk in &chunks {
            self.services
                .gateway
                .send_message(channel, Content::text(chunk.clone()))
                .await?;
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_expands_shorthand() {
        let parsed = parse_command("!t-Add  Orc_Hero  gef_fild14 60 70").unwrap();
        assert_eq!(parsed.name, "track-add");
        assert_eq!(parsed.args, vec!["Orc_Hero", "gef_fild14", "60", "70"]);
        assert_eq!(parse_command("!T").unwrap().name, "track");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");
        let payload: Box<dyn Any + Send> = Box::new(3_u8);
        assert_eq!(panic_message(&*payload), "unknown panic");
    }

    #[test]
    fn test_parse_command_needs_prefix() {
        assert!(parse_command("track amon").is_none());
        assert!(parse_command("! track").is_none());
        assert!(parse_command("").is_none());
        assert_eq!(parse_command("!tea").unwrap().name, "tea");
    }
}
