//! Command registration and dispatch.

use serde::Serialize;

use crate::types::BotResult;

use super::{alerts, cancel, catalog, editors, settings, track, CommandContext};

/// Who may run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Access {
    Anyone,
    /// Editors only, unless called without arguments (which only displays).
    EditorWithArgs,
    Editor,
}

impl Access {
    pub fn requires_editor(self, has_args: bool) -> bool {
        match self {
            Access::Anyone => false,
            Access::EditorWithArgs => has_args,
            Access::Editor => true,
        }
    }
}

/// One documented way to call a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub args: &'static str,
    pub summary: &'static str,
    pub example: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub access: Access,
    pub usages: &'static [Usage],
}

const HELP_NOTES: &str = "\
General notes:
    Except for !track itself, spaces in names must be written as
    underscores (Golden_Thief_Bug).
    !t works in place of !track, also for e.g. !t-add instead of !track-add.
    Times are either a number of minutes ago or a server clock time HH:MM.";

pub struct CommandRegistry;

impl CommandRegistry {
    pub fn list_commands() -> Vec<CommandDefinition> {
        let mut commands = Vec::new();
        commands.extend(track::definitions());
        commands.extend(cancel::definitions());
        commands.extend(catalog::definitions());
        commands.extend(alerts::definitions());
        commands.extend(editors::definitions());
        commands.extend(settings::definitions());
        commands.sort_by_key(|command| command.name);
        commands
    }

    /// Map a typed command word (without `!`) to its canonical name:
    /// `t` and `t-…` are shorthands for `track` and `track-…`.
    pub fn canonical_name(word: &str) -> String {
        match word.strip_prefix('t') {
            Some(rest) if rest.is_empty() || rest.starts_with('-') => format!("track{rest}"),
            _ => word.to_string(),
        }
    }

    pub fn definition(name: &str) -> Option<CommandDefinition> {
        Self::list_commands()
            .into_iter()
            .find(|command| command.name == name)
    }

    /// Run a command by canonical name. Access has already been checked.
    pub async fn call(
        name: &str,
        args: &[String],
        ctx: &mut CommandContext<'_>,
    ) -> BotResult<String> {
        match name {
            "track" => track::execute(ctx, args).await,
            "track-cancel" => cancel::execute(ctx, args).await,
            "track-add" => catalog::add(ctx, args),
            "track-edit" => catalog::edit(ctx, args),
            "track-remove" => catalog::remove(ctx, args).await,
            "track-alert" => alerts::alert(ctx, args),
            "track-remove-alert" => alerts::remove_alert(ctx, args),
            "track-alert-role" => alerts::alert_role(ctx, args).await,
            "track-add-editor" => editors::add_editor(ctx, args).await,
            "track-remove-editor" => editors::remove_editor(ctx, args).await,
            "track-channel" => settings::channel(ctx, args).await,
            "track-auto-refresh" => settings::auto_refresh(ctx, args),
            "track-expire" => settings::expire(ctx, args),
            "track-utc-offset" => settings::utc_offset(ctx, args),
            "track-conf" => settings::conf(ctx, args).await,
            "track-help" => Ok(Self::help(!args.is_empty())),
            _ => Err(crate::types::BotError::Internal(format!(
                "Unknown command: {name}"
            ))),
        }
    }

    /// Help text generated from the command definitions.
    pub fn help(args_ignored: bool) -> String {
        let preamble = if args_ignored {
            "Note: arguments ignored\n\n"
        } else {
            ""
        };
        let mut sections = vec![HELP_NOTES.to_string(), "Commands:".to_string()];
        for command in Self::list_commands() {
            for usage in command.usages {
                sections.push(Self::usage_text(&command, usage));
            }
        }
        format!("```\n{preamble}{}\n```", sections.join("\n\n"))
    }

    fn usage_text(command: &CommandDefinition, usage: &Usage) -> String {
        let mut line = format!("!{}", command.name);
        if !usage.args.is_empty() {
            line.push(' ');
            line.push_str(usage.args);
        }
        if command.access.requires_editor(!usage.args.is_empty()) {
            line.push_str(" (editor only)");
        }
        line.push_str(": ");
        line.push_str(usage.summary);
        if let Some(example) = usage.example {
            line.push_str("\nExample: ");
            line.push_str(example);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names() {
        assert_eq!(CommandRegistry::canonical_name("t"), "track");
        assert_eq!(CommandRegistry::canonical_name("t-add"), "track-add");
        assert_eq!(CommandRegistry::canonical_name("track-add"), "track-add");
        assert_eq!(CommandRegistry::canonical_name("tx"), "tx");
    }

    #[test]
    fn test_every_command_is_listed_once() {
        let commands = CommandRegistry::list_commands();
        assert_eq!(commands.len(), 16);
        let mut names: Vec<_> = commands.iter().map(|c| c.name).collect();
        names.dedup();
        assert_eq!(names.len(), 16);
        assert!(commands.iter().all(|c| !c.usages.is_empty()));
    }

    #[test]
    fn test_access_levels() {
        let access = |name| CommandRegistry::definition(name).unwrap().access;
        assert_eq!(access("track"), Access::Anyone);
        assert_eq!(access("track-conf"), Access::Anyone);
        assert_eq!(access("track-add"), Access::EditorWithArgs);
        assert_eq!(access("track-remove-alert"), Access::Editor);
        assert!(!Access::EditorWithArgs.requires_editor(false));
        assert!(Access::Editor.requires_editor(false));
    }

    #[test]
    fn test_help_is_fenced_and_marks_editor_usages() {
        let help = CommandRegistry::help(false);
        assert!(help.starts_with("```\nGeneral notes:"));
        assert!(help.ends_with("\n```"));
        assert!(help.contains("!track-channel <#channel> (editor only): "));
        assert!(help.contains("\n\n!track-channel: "));
        assert!(CommandRegistry::help(true).starts_with("```\nNote: arguments ignored\n\n"));
    }
}
