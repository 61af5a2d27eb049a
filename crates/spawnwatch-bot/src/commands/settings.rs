//! Group settings: board channel, refresh and expiry times, server clock
//! offset, plus `!track-conf`.

use spawnwatch::format::parse_minutes;

use super::alerts::configured_alerts;
use super::registry::{Access, CommandDefinition, Usage};
use super::CommandContext;
use crate::gateway::MentionKind;
use crate::scheduler;
use crate::types::{BotError, BotResult};

const MINUTES_PER_DAY: i64 = 24 * 60;

const CHANNEL_USAGES: &[Usage] = &[
    Usage {
        args: "",
        summary: "Show the tracking channel.",
        example: None,
    },
    Usage {
        args: "<#channel>",
        summary: "Post the board in the given channel. Every other message in \
            that channel is deleted whenever the board is refreshed, so use a \
            dedicated channel.",
        example: Some("!track-channel #mvp-board"),
    },
];

const AUTO_REFRESH_USAGES: &[Usage] = &[
    Usage {
        args: "",
        summary: "Show how many minutes pass between automatic refreshes.",
        example: None,
    },
    Usage {
        args: "<minutes>",
        summary: "Set the automatic refresh interval; 0 turns it off.",
        example: None,
    },
];

const EXPIRE_USAGES: &[Usage] = &[
    Usage {
        args: "",
        summary: "Show the expiration time. Monsters up for at least this long \
            stop being tracked.",
        example: None,
    },
    Usage {
        args: "<minutes | HH:MM>",
        summary: "Set the expiration time; 0 disables expiration, so tracking \
            only ends with !track-cancel or a new !track.",
        example: None,
    },
];

const UTC_OFFSET_USAGES: &[Usage] = &[
    Usage {
        args: "",
        summary: "Show the server clock's offset from UTC.",
        example: None,
    },
    Usage {
        args: "<[-]HH:MM>",
        summary: "Set the server clock's offset from UTC.",
        example: Some("!track-utc-offset -04:00"),
    },
];

const CONF_USAGES: &[Usage] = &[Usage {
    args: "",
    summary: "Show the configuration, including every trackable monster. \
        Arguments are ignored.",
    example: None,
}];

const HELP_USAGES: &[Usage] = &[Usage {
    args: "",
    summary: "Show this message. Arguments are ignored.",
    example: None,
}];

pub fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition {
            name: "track-channel",
            access: Access::EditorWithArgs,
            usages: CHANNEL_USAGES,
        },
        CommandDefinition {
            name: "track-auto-refresh",
            access: Access::EditorWithArgs,
            usages: AUTO_REFRESH_USAGES,
        },
        CommandDefinition {
            name: "track-expire",
            access: Access::EditorWithArgs,
            usages: EXPIRE_USAGES,
        },
        CommandDefinition {
            name: "track-utc-offset",
            access: Access::EditorWithArgs,
            usages: UTC_OFFSET_USAGES,
        },
        CommandDefinition {
            name: "track-conf",
            access: Access::Anyone,
            usages: CONF_USAGES,
        },
        CommandDefinition {
            name: "track-help",
            access: Access::Anyone,
            usages: HELP_USAGES,
        },
    ]
}

async fn channel_label(ctx: &mut CommandContext<'_>) -> String {
    ctx.session
        .channel(ctx.services.gateway.as_ref())
        .await
        .map_or_else(|| "unset".to_string(), |channel| channel.mention)
}

pub async fn channel(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    const FAILED: &str = "Failed to set channel";
    match args {
        [] => Ok(format!("Tracking channel: {}", channel_label(ctx).await)),
        [token] => {
            let channel = ctx
                .gateway()
                .resolve_mention(ctx.session.id(), token, MentionKind::Channel)
                .await
                .ok_or_else(|| {
                    BotError::validation(FAILED, format!("{token} is not a channel mention"))
                })?;
            ctx.session.set_channel(channel);
            tracing::info!("Group {} now posts its board in {channel}", ctx.session.id());
            Ok(format!("Tracking channel now set to {token}"))
        }
        _ => Err(BotError::validation(FAILED, "expected at most one argument")),
    }
}

pub fn auto_refresh(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    const FAILED: &str = "Failed to set auto refresh time";
    let text = match args {
        [] => {
            return Ok(format!(
                "Tracking information auto-refresh time: {}",
                ctx.session.config.auto_refresh_label()
            ))
        }
        [text] => text,
        _ => return Err(BotError::validation(FAILED, "expected at most 1 argument")),
    };
    let minutes: i64 = text
        .parse()
        .map_err(|_| BotError::validation(FAILED, "expected an integer"))?;
    if minutes < 0 {
        return Err(BotError::validation(FAILED, "auto-refresh time must not be negative"));
    }
    let minutes = u32::try_from(minutes)
        .map_err(|_| BotError::validation(FAILED, "auto-refresh time is too large"))?;

    ctx.session.config.auto_refresh = minutes;
    if minutes == 0 {
        ctx.session.set_refresh_task(None);
        return Ok("Auto-refresh disabled".to_string());
    }
    let task = scheduler::spawn_refresh_loop(ctx.services.clone(), ctx.shared.clone());
    ctx.session.set_refresh_task(Some(task));
    Ok(format!(
        "Updated auto-refresh time to {}",
        ctx.session.config.auto_refresh_label()
    ))
}

pub fn expire(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    const FAILED: &str = "Failed to set expire time";
    let text = match args {
        [] => {
            return Ok(format!(
                "Expiration time is {}",
                ctx.session.config.expire_label()
            ))
        }
        [text] => text,
        _ => return Err(BotError::validation(FAILED, "expected at most 1 argument")),
    };
    let minutes = parse_minutes(text).ok_or_else(|| {
        BotError::validation(
            FAILED,
            "tracked boss expiration time should be in HH:MM format, or just the number of minutes",
        )
    })?;
    if minutes < 0 {
        return Err(BotError::validation(FAILED, "expire time must not be negative"));
    }
    let minutes = u32::try_from(minutes)
        .map_err(|_| BotError::validation(FAILED, "expire time is too large"))?;

    ctx.session.config.expire = minutes;
    if minutes == 0 {
        return Ok("Tracked monster expiration time is now unset: monsters will remain \
            tracked until they are either tracked again with !track or cancelled with \
            !track-cancel."
            .to_string());
    }
    Ok(format!(
        "Tracked monster expiration time now set to {}",
        ctx.session.config.expire_label()
    ))
}

pub fn utc_offset(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    const FAILED: &str = "Failed to set UTC offset";
    let text = match args {
        [] => {
            return Ok(format!(
                "Server time UTC offset: {}",
                ctx.session.config.utc_offset_label()
            ))
        }
        [text] => text,
        _ => return Err(BotError::validation(FAILED, "expected at most one argument")),
    };
    let minutes = parse_minutes(text)
        .filter(|minutes| text.contains(':') && minutes.abs() < MINUTES_PER_DAY)
        .ok_or_else(|| {
            BotError::validation(FAILED, format!("{text} not formatted as HH:MM or -HH:MM"))
        })?;
    ctx.session.config.utc_offset = minutes;
    Ok(format!(
        "Server time UTC offset set to {}",
        ctx.session.config.utc_offset_label()
    ))
}

pub async fn conf(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    let preamble = if args.is_empty() {
        ""
    } else {
        "Note: arguments ignored\n"
    };
    let channel = channel_label(ctx).await;
    let role = ctx
        .session
        .alert_role(ctx.services.gateway.as_ref())
        .await
        .map_or_else(|| "not configured".to_string(), |role| role.mention);
    let config = &ctx.session.config;
    let editors = if config.editors.is_empty() {
        "None".to_string()
    } else {
        config
            .editors
            .iter()
            .map(|id| format!("<@{id}>"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let catalog = ctx.session.tracker.catalog();
    let monsters = catalog
        .entities()
        .keys()
        .filter_map(|entity| catalog.describe(entity))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "```\n{preamble}\
         Channel: {channel}\n\
         Auto-refresh time: {}\n\
         Expire time: {}\n\
         Server time UTC offset: {}\n\
         Alert role: {role}\n\
         Editors: {editors}\n\n\
         Alerts:{}\n\n\
         Trackable monsters ({}):\n{monsters}\n```",
        config.auto_refresh_label(),
        config.expire_label(),
        config.utc_offset_label(),
        configured_alerts(ctx.session.tracker.rules()),
        catalog.len(),
    ))
}
