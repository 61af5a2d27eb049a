//! Chat commands.
//!
//! One module per command family; [`registry::CommandRegistry`] routes a
//! command name to its handler. Handlers run with the group lock held and
//! return the reply text, or a rejection that is shown to the user as-is.

pub mod alerts;
pub mod cancel;
pub mod catalog;
pub mod continuation;
pub mod editors;
pub mod registry;
pub mod settings;
pub mod track;

use crate::gateway::MessagingGateway;
use crate::render;
use crate::services::Services;
use crate::session::{GroupSession, SharedSession};
use crate::types::{Author, BotError, BotResult};

use continuation::{ChoiceValue, PendingOperation};

pub use registry::{Access, CommandDefinition, CommandRegistry, Usage};

/// What a command handler gets to work with.
pub struct CommandContext<'a> {
    /// The group, locked for the duration of the command.
    pub session: &'a mut GroupSession,
    /// The same group, for tasks that outlive the command.
    pub shared: &'a SharedSession,
    pub services: &'a Services,
    pub author: &'a Author,
}

impl CommandContext<'_> {
    pub fn gateway(&self) -> &dyn MessagingGateway {
        self.services.gateway.as_ref()
    }

    /// Refresh the group's board.
    pub async fn refresh(&mut self) -> BotResult<()> {
        render::refresh(self.session, self.services.gateway.as_ref()).await
    }

    /// Whether `user` may run editor commands: a configured editor, or
    /// anyone allowed to manage the group.
    pub async fn is_editor(&self, user: u64) -> bool {
        if self.session.is_listed_editor(user) {
            return true;
        }
        if user == self.author.id && self.author.manage_group {
            return true;
        }
        self.gateway()
            .has_manage_permission(self.session.id(), user)
            .await
    }

    /// Suspend `operation` until the author picks one of `options`.
    pub fn prompt(
        &mut self,
        message: &str,
        options: Vec<(String, ChoiceValue)>,
        operation: PendingOperation,
        sort: bool,
    ) -> String {
        self.session
            .prompt(self.author.id, message, options, operation, sort)
    }
}

/// A rejection line for replies that report several outcomes at once.
pub(crate) fn fail_line(operation: &str, reason: impl Into<String>) -> String {
    BotError::validation(operation, reason).to_string()
}

/// Reply line for one outcome of a multi-outcome command.
pub(crate) fn outcome_line(result: BotResult<String>) -> BotResult<String> {
    match result {
        Ok(line) => Ok(line),
        Err(e) if e.is_rejection() => Ok(e.to_string()),
        Err(e) => Err(e),
    }
}
