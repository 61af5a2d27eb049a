//! Operations suspended behind a numbered prompt, and how they resume.

use spawnwatch::{Continuation, Resumption, RuleId, SpawnKey, SpawnRule};

use super::catalog::EditRequest;
use super::{alerts, cancel, catalog, track, CommandContext};
use crate::types::{BotError, BotResult};

/// What a prompt option stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceValue {
    Spawn(SpawnKey),
    Entity(String),
    /// A name that is not in the catalog yet.
    NewEntity(String),
    Rule(RuleId),
}

/// A command waiting for its author to pick an option.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOperation {
    /// `window` is `None` for a sighting with unknown death time.
    Track { tod: f64, window: Option<f64> },
    Cancel,
    Add { location: String, rule: SpawnRule },
    EditEntity(EditRequest),
    EditSpawn(EditRequest),
    Remove,
    RemoveAlert,
}

impl Continuation for PendingOperation {
    fn accepts_batch(&self) -> bool {
        matches!(self, PendingOperation::Track { .. })
    }
}

fn mismatch(operation: &PendingOperation, value: &ChoiceValue) -> BotError {
    BotError::Internal(format!("{operation:?} cannot resume with {value:?}"))
}

/// Run a suspended operation with the option(s) its author picked.
pub async fn resume(
    ctx: &mut CommandContext<'_>,
    resumption: Resumption<ChoiceValue, PendingOperation>,
) -> BotResult<String> {
    match resumption {
        Resumption::Many {
            values,
            continuation: PendingOperation::Track { tod, window },
        } => {
            let keys = values
                .into_iter()
                .map(|value| match value {
                    ChoiceValue::Spawn(key) => Ok(key),
                    other => Err(BotError::Internal(format!("Cannot track {other:?}"))),
                })
                .collect::<BotResult<Vec<_>>>()?;
            track::track_many(ctx, keys, tod, window).await
        }
        Resumption::Many { continuation, .. } => Err(BotError::Internal(format!(
            "{continuation:?} cannot resume with several options"
        ))),
        Resumption::One {
            value,
            continuation,
        } => match (continuation, value) {
            (PendingOperation::Track { tod, window }, ChoiceValue::Spawn(key)) => {
                track::track_spawn(ctx, &key, tod, window, true).await
            }
            (PendingOperation::Cancel, ChoiceValue::Spawn(key)) => {
                cancel::cancel_spawn(ctx, &key).await
            }
            (PendingOperation::Add { location, rule }, choice) => {
                catalog::add_to(ctx, choice, &location, rule)
            }
            (PendingOperation::EditEntity(request), ChoiceValue::Entity(entity)) => {
                catalog::edit_entity(ctx, &entity, &request)
            }
            (PendingOperation::EditSpawn(request), ChoiceValue::Spawn(key)) => {
                catalog::edit_spawn(ctx, &key, &request)
            }
            (PendingOperation::Remove, ChoiceValue::Spawn(key)) => {
                catalog::remove_spawn(ctx, &key).await
            }
            (PendingOperation::RemoveAlert, ChoiceValue::Rule(id)) => {
                alerts::remove_rule(ctx, id)
            }
            (operation, value) => Err(mismatch(&operation, &value)),
        },
    }
}
