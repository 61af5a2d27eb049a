//! `!track-add-editor` and `!track-remove-editor`.

use super::registry::{Access, CommandDefinition, Usage};
use super::{fail_line, CommandContext};
use crate::gateway::MentionKind;
use crate::types::{BotError, BotResult};

const ADD_USAGES: &[Usage] = &[Usage {
    args: "<@user...>",
    summary: "Make one or more users editors.",
    example: Some("!track-add-editor @User1 @User2"),
}];

const REMOVE_USAGES: &[Usage] = &[Usage {
    args: "<@user...>",
    summary: "Take editor privileges away from one or more users. Group \
        managers always stay editors.",
    example: Some("!track-remove-editor @Keele @Hixxy"),
}];

pub fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition {
            name: "track-add-editor",
            access: Access::EditorWithArgs,
            usages: ADD_USAGES,
        },
        CommandDefinition {
            name: "track-remove-editor",
            access: Access::EditorWithArgs,
            usages: REMOVE_USAGES,
        },
    ]
}

async fn user_mention(ctx: &CommandContext<'_>, token: &str) -> Option<u64> {
    ctx.gateway()
        .resolve_mention(ctx.session.id(), token, MentionKind::User)
        .await
}

pub async fn add_editor(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    const FAILED: &str = "Failed to add editor";
    if args.is_empty() {
        return Err(BotError::validation(FAILED, "No user mentions given"));
    }
    let mut lines = Vec::with_capacity(args.len());
    for arg in args {
        let Some(user) = user_mention(ctx, arg).await else {
            lines.push(fail_line(FAILED, format!("{arg} is not a user mention")));
            continue;
        };
        if ctx.session.is_listed_editor(user) {
            lines.push(fail_line(FAILED, format!("{arg} is already an editor")));
        } else {
            ctx.session.config.editors.push(user);
            lines.push(format!("Successfully added {arg} as an editor"));
        }
    }
    Ok(lines.join("\n"))
}

pub async fn remove_editor(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    const FAILED: &str = "Failed to remove editor";
    if args.is_empty() {
        return Err(BotError::validation(FAILED, "no user mentions given"));
    }
    let mut lines = Vec::with_capacity(args.len());
    for arg in args {
        let Some(user) = user_mention(ctx, arg).await else {
            lines.push(fail_line(FAILED, format!("{arg} is not a user mention")));
            continue;
        };
        if !ctx.is_editor(user).await {
            lines.push(fail_line(FAILED, format!("{arg} is not an editor")));
        } else if ctx.session.is_listed_editor(user) {
            ctx.session.config.editors.retain(|&editor| editor != user);
            lines.push(format!("Removed {arg} as an editor"));
        } else {
            lines.push(fail_line(
                FAILED,
                format!("{arg} is a server manager and may not be removed"),
            ));
        }
    }
    Ok(lines.join("\n"))
}
