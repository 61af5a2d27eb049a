//! Error types for the bot.

use spawnwatch::TrackerError;

/// All errors that can occur while serving a group.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// A tracker rejection that was not given a more specific operation.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// A user-facing rejection: `<operation>: <reason>`.
    #[error("{operation}: {reason}")]
    Validation { operation: String, reason: String },

    #[error("!{command} failed: {user} is not an editor")]
    PermissionDenied { command: String, user: String },

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    pub fn validation(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        BotError::Validation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is an expected rejection to be shown as-is, rather
    /// than a failure of the service.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BotError::Tracker(_) | BotError::Validation { .. } | BotError::PermissionDenied { .. }
        )
    }
}

/// Attach an operation name to tracker rejections.
pub trait RejectAs<T> {
    fn reject_as(self, operation: &str) -> BotResult<T>;
}

impl<T> RejectAs<T> for Result<T, TrackerError> {
    fn reject_as(self, operation: &str) -> BotResult<T> {
        self.map_err(|e| BotError::validation(operation, e.to_string()))
    }
}

pub type BotResult<T> = Result<T, BotError>;
