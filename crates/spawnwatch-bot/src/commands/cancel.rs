//! `!track-cancel`: stop tracking spawns.

use spawnwatch::SpawnKey;

use super::continuation::{ChoiceValue, PendingOperation};
use super::registry::{Access, CommandDefinition, Usage};
use super::{fail_line, CommandContext};
use crate::types::{BotError, BotResult};

const FAILED: &str = "Failed to cancel";

const USAGES: &[Usage] = &[
    Usage {
        args: "<monsters...>",
        summary: "Cancel tracking for one or more monsters.",
        example: Some("!track-cancel gtb missy"),
    },
    Usage {
        args: "all",
        summary: "Cancel tracking for every monster.",
        example: None,
    },
];

pub fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition {
        name: "track-cancel",
        access: Access::Anyone,
        usages: USAGES,
    }]
}

pub async fn execute(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    if args.is_empty() {
        return Err(BotError::validation(FAILED, "no boss names given"));
    }
    if ctx.session.tracker.store().is_empty() {
        return Err(BotError::validation(FAILED, "nothing is being tracked"));
    }

    if args.len() == 1 && args[0].eq_ignore_ascii_case("all") {
        let cancelled = ctx.session.tracker.cancel_all();
        tracing::debug!("Cancelled {cancelled} tracked spawn(s)");
        ctx.refresh().await?;
        return Ok("Successfully cancelled all tracked bosses".to_string());
    }

    let mut lines = Vec::with_capacity(args.len());
    let mut cancelled_any = false;
    for arg in args {
        let keys = ctx.session.tracker.resolve_tracked(arg);
        match keys.as_slice() {
            [] => lines.push(fail_line(
                FAILED,
                format!("no boss aliased by {arg} is currently being tracked"),
            )),
            [key] => {
                let label = ctx.session.tracker.label(key);
                if ctx.session.tracker.cancel(key) {
                    cancelled_any = true;
                    lines.push(format!("Successfully cancelled {label}"));
                } else {
                    lines.push(fail_line(FAILED, format!("{label} not currently being tracked")));
                }
            }
            _ if args.len() == 1 => {
                let options = keys
                    .iter()
                    .map(|key| (ctx.session.tracker.label(key), ChoiceValue::Spawn(key.clone())))
                    .collect();
                return Ok(ctx.prompt(
                    "Which spawn should be cancelled?",
                    options,
                    PendingOperation::Cancel,
                    true,
                ));
            }
            _ => lines.push(fail_line(
                FAILED,
                format!("{arg} is ambiguous. To disambiguate, cancel {arg} only: !track-cancel {arg}"),
            )),
        }
    }
    if cancelled_any {
        ctx.refresh().await?;
    }
    Ok(lines.join("\n"))
}

/// Cancel the spawn picked from a prompt.
pub(crate) async fn cancel_spawn(ctx: &mut CommandContext<'_>, key: &SpawnKey) -> BotResult<String> {
    let label = ctx.session.tracker.label(key);
    if !ctx.session.tracker.cancel(key) {
        return Err(BotError::validation(
            format!("Failed to cancel {label}"),
            "not currently tracked",
        ));
    }
    ctx.refresh().await?;
    Ok(format!("Successfully cancelled {label}"))
}
