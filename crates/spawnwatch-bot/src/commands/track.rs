//! `!track`: refresh the board or record a death.

use spawnwatch::format::{format_clock, parse_time_of_death};
use spawnwatch::{parse_selector, SpawnKey};

use super::continuation::{ChoiceValue, PendingOperation};
use super::registry::{Access, CommandDefinition, Usage};
use super::{outcome_line, CommandContext};
use crate::types::{BotError, BotResult, RejectAs};

const FAILED: &str = "Failed to track boss";

const USAGES: &[Usage] = &[
    Usage {
        args: "",
        summary: "Refresh the list of tracked monsters.",
        example: None,
    },
    Usage {
        args: "<monster> [time of death]",
        summary: "Track the monster, assuming it died at the given time, or \
            just now when no time is given. Replaces earlier tracking of the \
            same spawn.",
        example: Some("!track gtb 5:30"),
    },
    Usage {
        args: "<monster> <alive time> <dead time>",
        summary: "Track the monster, known to be alive at the first time and \
            dead at the second. Use only when the window is inferred, not \
            estimated.",
        example: Some("!t vocal 30 10"),
    },
    Usage {
        args: "<monster> ? [time seen dead]",
        summary: "Track the monster, seen dead with an unknown time of death. \
            Narrows an existing window when the spawn is already tracked.",
        example: Some("!track gr ?"),
    },
    Usage {
        args: "<monster> [times] <'N | a,b-c>",
        summary: "Pick the spawn(s) up front instead of answering a prompt.",
        example: Some("!t dark lord 10 1-2"),
    },
];

pub fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition {
        name: "track",
        access: Access::Anyone,
        usages: USAGES,
    }]
}

fn fail(reason: impl Into<String>) -> BotError {
    BotError::validation(FAILED, reason)
}

/// Where a death observation starts and how wide its window is. `window`
/// is `None` for a sighting with unknown death time.
struct Observation {
    name_end: usize,
    tod: Option<f64>,
    window: Option<f64>,
}

fn parse_observation(args: &[String], now: f64, utc_offset: i64) -> BotResult<Observation> {
    let parse = |text: &str| parse_time_of_death(text, now, utc_offset);

    if let Some(mark) = args.iter().position(|arg| arg == "?") {
        let extra = &args[mark + 1..];
        if extra.len() > 1 {
            return Err(fail("only 1 argument expected after question mark"));
        }
        let tod = match extra.first() {
            Some(text) => Some(parse(text).ok_or_else(|| fail(format!("{text} is not a valid time")))?),
            None => None,
        };
        return Ok(Observation {
            name_end: mark,
            tod,
            window: None,
        });
    }

    let mut observation = Observation {
        name_end: args.len(),
        tod: None,
        window: Some(0.0),
    };
    if args.len() < 2 {
        return Ok(observation);
    }
    let Some(dead) = parse(&args[args.len() - 1]) else {
        return Ok(observation);
    };
    observation.tod = Some(dead);
    observation.name_end -= 1;
    if args.len() > 2 {
        if let Some(alive) = parse(&args[args.len() - 2]) {
            if alive >= dead {
                return Err(fail("alive time should be before death time"));
            }
            observation.name_end -= 1;
            observation.window = Some(dead - alive);
        }
    }
    Ok(observation)
}

pub async fn execute(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    if ctx.session.config.channel.is_none() {
        return Err(fail(
            "Tracking channel not configured. Use !track-channel to set the tracking channel.",
        ));
    }
    if args.is_empty() {
        ctx.refresh().await?;
        return Ok("Tracking info refreshed".to_string());
    }

    let (args, selection) = match args.split_last() {
        Some((last, rest)) => match parse_selector(last) {
            Some(selection) => (rest, Some(selection)),
            None => (args, None),
        },
        None => (args, None),
    };

    let now = ctx.session.send_time;
    let observation = parse_observation(args, now, ctx.session.config.utc_offset)?;
    let name = args[..observation.name_end].join(" ");
    if name.trim().is_empty() {
        return Err(fail("no boss name given"));
    }
    let tod = observation.tod.unwrap_or(now);
    let window = observation.window;

    let catalog = ctx.session.tracker.catalog();
    let entities = catalog.resolve(&name);
    if entities.is_empty() {
        return Err(fail(format!("{name} is not a recognized boss or alias")));
    }

    if catalog.is_unambiguous(&entities) {
        if selection.is_some() {
            return Err(fail(format!("{name} is already unambiguous")));
        }
        let key = catalog
            .first_spawn(&entities)
            .ok_or_else(|| BotError::Internal(format!("{name} resolved to a boss without spawns")))?;
        return track_spawn(ctx, &key, tod, window, true).await;
    }

    let options = catalog.spawn_options(&entities);
    if let Some(selection) = selection {
        let indices = selection.indices();
        if let Some(&highest) = indices.iter().max().filter(|&&i| i > options.len()) {
            return Err(fail(format!(
                "{highest} greater than number of options to choose from"
            )));
        }
        let keys = indices
            .into_iter()
            .map(|index| options[index - 1].1.clone())
            .collect();
        return track_many(ctx, keys, tod, window).await;
    }

    let options = options
        .into_iter()
        .map(|(label, key)| (label, ChoiceValue::Spawn(key)))
        .collect();
    Ok(ctx.prompt(
        "Which spawn was it?",
        options,
        PendingOperation::Track { tod, window },
        true,
    ))
}

/// Record one death and report it.
pub(crate) async fn track_spawn(
    ctx: &mut CommandContext<'_>,
    key: &SpawnKey,
    tod: f64,
    window: Option<f64>,
    refresh: bool,
) -> BotResult<String> {
    let tracker = &mut ctx.session.tracker;
    let label = tracker.label(key);
    let window = match window {
        Some(window) => window,
        None => tracker.unknown_window(key, tod).reject_as(FAILED)?,
    };
    tracker.track(key, tod, window).reject_as(FAILED)?;

    let offset = ctx.session.config.utc_offset;
    let died = if window > 0.0 {
        format!(
            "died between {} and {}",
            format_clock(tod - window, offset),
            format_clock(tod, offset)
        )
    } else {
        format!("died at {}", format_clock(tod, offset))
    };
    if refresh {
        ctx.refresh().await?;
    }
    Ok(format!("Now tracking {label} ({died})"))
}

/// Record the same death for several spawns, then refresh once.
pub(crate) async fn track_many(
    ctx: &mut CommandContext<'_>,
    keys: Vec<SpawnKey>,
    tod: f64,
    window: Option<f64>,
) -> BotResult<String> {
    let mut lines = Vec::with_capacity(keys.len());
    for key in keys {
        lines.push(outcome_line(track_spawn(ctx, &key, tod, window, false).await)?);
    }
    ctx.refresh().await?;
    Ok(lines.join("\n"))
}
