//! Alert rules and the role mentioned when they fire.

use spawnwatch::{AlertRules, RuleId};

use super::continuation::{ChoiceValue, PendingOperation};
use super::registry::{Access, CommandDefinition, Usage};
use super::CommandContext;
use crate::gateway::MentionKind;
use crate::types::{BotError, BotResult, RejectAs};

const ALERT_USAGES: &[Usage] = &[
    Usage {
        args: "",
        summary: "List the configured alerts.",
        example: None,
    },
    Usage {
        args: "<expression>",
        summary: "Post an alert to the tracking channel when the expression \
            becomes true for a tracked monster. Variables: min and max (earliest \
            and latest spawn time), now, and prob (0 to 1, chance it is up). \
            Supports arithmetic, comparisons, and/or/not.",
        example: Some("!t-alert now - min > 2"),
    },
];

const REMOVE_ALERT_USAGES: &[Usage] = &[Usage {
    args: "",
    summary: "Remove a configured alert, picked from a list.",
    example: None,
}];

const ALERT_ROLE_USAGES: &[Usage] = &[
    Usage {
        args: "",
        summary: "Show the role mentioned with alerts, if any.",
        example: None,
    },
    Usage {
        args: "<@role>",
        summary: "Mention the given role whenever an alert goes off.",
        example: None,
    },
];

pub fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition {
            name: "track-alert",
            access: Access::EditorWithArgs,
            usages: ALERT_USAGES,
        },
        CommandDefinition {
            name: "track-remove-alert",
            access: Access::Editor,
            usages: REMOVE_ALERT_USAGES,
        },
        CommandDefinition {
            name: "track-alert-role",
            access: Access::EditorWithArgs,
            usages: ALERT_ROLE_USAGES,
        },
    ]
}

/// Rule sources, one per line after a leading newline, or ` None`.
pub(crate) fn configured_alerts(rules: &AlertRules) -> String {
    if rules.is_empty() {
        return " None".to_string();
    }
    rules
        .iter()
        .map(|rule| format!("\n{}", rule.source()))
        .collect()
}

pub fn alert(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    if args.is_empty() {
        return Ok(format!(
            "```\nConfigured alerts:{}\n```",
            configured_alerts(ctx.session.tracker.rules())
        ));
    }
    let source = args.join(" ");
    let now = ctx.session.send_time;
    ctx.session
        .tracker
        .add_rule(&source, now)
        .reject_as("Failed to add alert")?;
    tracing::info!("Group {} added alert `{source}`", ctx.session.id());
    Ok("Successfully added alert".to_string())
}

pub fn remove_alert(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    const FAILED: &str = "Failed to remove alert";
    if !args.is_empty() {
        return Err(BotError::validation(FAILED, "!t-remove-alert expects 0 arguments"));
    }
    let rules = ctx.session.tracker.rules();
    let options: Vec<(String, ChoiceValue)> = rules
        .iter()
        .map(|rule| (rule.source().to_string(), ChoiceValue::Rule(rule.id)))
        .collect();
    if options.is_empty() {
        return Err(BotError::validation(FAILED, "No alerts to remove"));
    }
    if let [(_, ChoiceValue::Rule(id))] = options.as_slice() {
        let id = *id;
        return remove_rule(ctx, id);
    }
    Ok(ctx.prompt(
        "Which alert do you want to remove?",
        options,
        PendingOperation::RemoveAlert,
        false,
    ))
}

/// Remove a rule by id. Fails if it was removed in the meantime.
pub(crate) fn remove_rule(ctx: &mut CommandContext<'_>, id: RuleId) -> BotResult<String> {
    let position = ctx.session.tracker.rules().position(id).ok_or_else(|| {
        BotError::validation("Failed to remove alert", "that alert no longer exists")
    })?;
    let source = ctx
        .session
        .tracker
        .remove_rule(position)
        .reject_as("Failed to remove alert")?;
    tracing::info!("Group {} removed alert `{source}`", ctx.session.id());
    Ok(format!("Successfully removed alert: {source}"))
}

pub async fn alert_role(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    const FAILED: &str = "Failed to set alert role";
    match args {
        [] => {
            let role = ctx.session.alert_role(ctx.services.gateway.as_ref()).await;
            let shown = role.map_or_else(|| "not configured".to_string(), |role| role.mention);
            Ok(format!("Alert role: {shown}"))
        }
        [token] => {
            let role = ctx
                .gateway()
                .resolve_mention(ctx.session.id(), token, MentionKind::Role)
                .await
                .ok_or_else(|| BotError::validation(FAILED, format!("{token} is not a role mention")))?;
            ctx.session.set_alert_role(role);
            Ok("Successfully configured alert role".to_string())
        }
        _ => Err(BotError::validation(FAILED, "expected at most 1 argument")),
    }
}
