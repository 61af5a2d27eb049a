//! Catalog editing: `!track-add`, `!track-edit` and `!track-remove`.

use std::collections::BTreeSet;

use spawnwatch::resolver::normalize;
use spawnwatch::{SpawnKey, SpawnRule};

use super::continuation::{ChoiceValue, PendingOperation};
use super::registry::{Access, CommandDefinition, Usage};
use super::CommandContext;
use crate::types::{BotError, BotResult, RejectAs};

const ADD_FAILED: &str = "Failed to add boss";
const ADD_SPAWN_FAILED: &str = "Failed to add spawn";
const EDIT_FAILED: &str = "Failed to edit";
const REMOVE_FAILED: &str = "Failed to remove boss";

const ADD_USAGES: &[Usage] = &[Usage {
    args: "<monster> <map> <min minutes> <max minutes>",
    summary: "Make a new spawn trackable. Adding to an existing monster adds \
        another spawn location for it. Aliases can be added with !track-edit.",
    example: Some("!track-add Amon_Ra Pyramid 60 70"),
}];

const EDIT_USAGES: &[Usage] = &[Usage {
    args: "<monster> <property=value...>",
    summary: "Edit a monster or one of its spawns. Properties: name, map, \
        min, max, aliases (replace all), aliases+ (add), aliases- (remove). \
        Alias lists are comma separated.",
    example: Some("!track-edit Silver_Thief_Bug name=Golden_Thief_Bug aliases+=gold,gtb"),
}];

const REMOVE_USAGES: &[Usage] = &[Usage {
    args: "<monster>",
    summary: "Make a spawn no longer trackable; the opposite of !track-add.",
    example: Some("!track-remove gtb"),
}];

pub fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition {
            name: "track-add",
            access: Access::EditorWithArgs,
            usages: ADD_USAGES,
        },
        CommandDefinition {
            name: "track-edit",
            access: Access::EditorWithArgs,
            usages: EDIT_USAGES,
        },
        CommandDefinition {
            name: "track-remove",
            access: Access::EditorWithArgs,
            usages: REMOVE_USAGES,
        },
    ]
}

fn parse_bound(which: &str, text: &str) -> BotResult<u32> {
    let value: i64 = text.parse().map_err(|_| {
        BotError::validation(
            ADD_FAILED,
            format!("given {which} respawn time \"{text}\" is not an integer"),
        )
    })?;
    if value < 0 {
        return Err(BotError::validation(
            ADD_FAILED,
            format!("given {which} respawn time is negative"),
        ));
    }
    u32::try_from(value).map_err(|_| {
        BotError::validation(ADD_FAILED, format!("given {which} respawn time is too large"))
    })
}

fn describe(ctx: &CommandContext<'_>, entity: &str) -> String {
    ctx.session
        .tracker
        .catalog()
        .describe(entity)
        .unwrap_or_else(|| entity.to_string())
}

pub fn add(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    let [name, map, min, max] = args else {
        return Err(BotError::validation(
            ADD_FAILED,
            "expected exactly 4 arguments (name, map, min spawn time in minutes, max spawn time in minutes)",
        ));
    };
    let display_name = name.replace('_', " ");
    let location = map.replace('_', " ");
    let rule = SpawnRule {
        min: parse_bound("min", min)?,
        max: parse_bound("max", max)?,
    };

    let catalog = ctx.session.tracker.catalog();
    let entities = catalog.resolve(&display_name);
    if entities.is_empty() {
        return add_to(ctx, ChoiceValue::NewEntity(display_name), &location, rule);
    }
    let exact = entities.len() == 1
        && entities
            .iter()
            .all(|entity| catalog.names(entity).contains(&normalize(&display_name)));
    if let (true, Some(entity)) = (exact, entities.first()) {
        let entity = entity.clone();
        return add_to(ctx, ChoiceValue::Entity(entity), &location, rule);
    }

    let mut options: Vec<(String, ChoiceValue)> = entities
        .into_iter()
        .map(|entity| (entity.clone(), ChoiceValue::Entity(entity)))
        .collect();
    options.sort_by_key(|(label, _)| label.replace(['(', ')'], ""));
    options.push((
        format!("New enemy named \"{display_name}\""),
        ChoiceValue::NewEntity(display_name),
    ));
    Ok(ctx.prompt(
        &format!("Which enemy do you mean by \"{name}\"?"),
        options,
        PendingOperation::Add { location, rule },
        false,
    ))
}

/// Add a spawn, either as a brand-new entity or to an existing one.
pub(crate) fn add_to(
    ctx: &mut CommandContext<'_>,
    choice: ChoiceValue,
    location: &str,
    rule: SpawnRule,
) -> BotResult<String> {
    match choice {
        ChoiceValue::NewEntity(name) => {
            ctx.session
                .tracker
                .add_entity(&name, location, rule)
                .reject_as(ADD_FAILED)?;
            tracing::info!("Group {} added boss {name}", ctx.session.id());
            Ok(format!("Successfully added enemy: {}", describe(ctx, &name)))
        }
        ChoiceValue::Entity(entity) => {
            ctx.session
                .tracker
                .add_spawn(&entity, location, rule)
                .reject_as(ADD_SPAWN_FAILED)?;
            Ok(format!(
                "Successfully added spawn for boss: {}",
                describe(ctx, &entity)
            ))
        }
        other => Err(BotError::Internal(format!("Cannot add a spawn to {other:?}"))),
    }
}

/// Requested changes of `!track-edit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditRequest {
    pub new_name: Option<String>,
    pub new_map: Option<String>,
    pub new_min: Option<u32>,
    pub new_max: Option<u32>,
    /// `aliases=`: replaces every alias.
    pub set_aliases: Option<BTreeSet<String>>,
    pub add_aliases: BTreeSet<String>,
    pub remove_aliases: BTreeSet<String>,
}

impl EditRequest {
    pub fn parse(edits: &[String]) -> BotResult<Self> {
        let fail = |reason: String| BotError::validation(EDIT_FAILED, reason);
        let mut request = Self::default();
        for edit in edits {
            let (key, value) = match edit.split('=').collect::<Vec<_>>().as_slice() {
                [key, value] => (key.to_lowercase(), *value),
                _ => {
                    return Err(fail(format!(
                        "{edit} is not formatted correctly (should be property=new)"
                    )))
                }
            };
            match key.as_str() {
                "min" | "max" => {
                    let minutes: i64 = value
                        .parse()
                        .map_err(|_| fail(format!("expected integer for {key} respawn time")))?;
                    if minutes <= 0 {
                        return Err(fail(format!("{key} respawn time must be positive")));
                    }
                    let minutes = u32::try_from(minutes)
                        .map_err(|_| fail(format!("{key} respawn time is too large")))?;
                    if key == "min" {
                        request.new_min = Some(minutes);
                    } else {
                        request.new_max = Some(minutes);
                    }
                }
                "name" => request.new_name = Some(value.replace('_', " ")),
                "map" => request.new_map = Some(value.replace('_', " ")),
                "aliases" | "aliases+" | "aliases-" => {
                    let aliases: BTreeSet<String> = value
                        .split(',')
                        .filter(|alias| !alias.is_empty())
                        .map(str::to_lowercase)
                        .collect();
                    match key.as_str() {
                        "aliases" => request.set_aliases = Some(aliases),
                        "aliases+" => request.add_aliases.extend(aliases),
                        _ => request.remove_aliases.extend(aliases),
                    }
                }
                _ => return Err(fail(format!("unrecognized property \"{key}\""))),
            }
        }
        if request.set_aliases.is_some()
            && !(request.add_aliases.is_empty() && request.remove_aliases.is_empty())
        {
            return Err(fail(
                "cannot set aliases and add/remove aliases at the same time".to_string(),
            ));
        }
        Ok(request)
    }

    /// Whether a specific spawn has to be picked for this request.
    pub fn touches_spawn(&self) -> bool {
        self.new_map.is_some() || self.new_min.is_some() || self.new_max.is_some()
    }

    /// The alias set after applying this request to `current`.
    pub fn aliases_for(&self, current: &[String]) -> BTreeSet<String> {
        if let Some(aliases) = &self.set_aliases {
            return aliases.clone();
        }
        current
            .iter()
            .cloned()
            .chain(self.add_aliases.iter().cloned())
            .filter(|alias| !self.remove_aliases.contains(alias))
            .collect()
    }
}

pub fn edit(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    let Some((name, edits)) = args.split_first() else {
        return Err(BotError::validation(EDIT_FAILED, "no boss given"));
    };
    let entities = ctx.session.tracker.catalog().resolve(name);
    if entities.is_empty() {
        return Err(BotError::validation(
            EDIT_FAILED,
            format!("{name} is not a recognized boss or alias"),
        ));
    }
    if edits.is_empty() {
        return Err(BotError::validation(EDIT_FAILED, "no edits requested"));
    }
    let request = EditRequest::parse(edits)?;

    if !request.touches_spawn() {
        if entities.len() == 1 {
            if let Some(entity) = entities.first().cloned() {
                return edit_entity(ctx, &entity, &request);
            }
        }
        let options = entities
            .into_iter()
            .map(|entity| (entity.clone(), ChoiceValue::Entity(entity)))
            .collect();
        return Ok(ctx.prompt(
            "Which monster do you want to edit?",
            options,
            PendingOperation::EditEntity(request),
            true,
        ));
    }

    let catalog = ctx.session.tracker.catalog();
    if catalog.is_unambiguous(&entities) {
        if let Some(key) = catalog.first_spawn(&entities) {
            return edit_spawn(ctx, &key, &request);
        }
    }
    let options = catalog
        .spawn_options(&entities)
        .into_iter()
        .map(|(label, key)| (label, ChoiceValue::Spawn(key)))
        .collect();
    Ok(ctx.prompt(
        "Which spawn do you want to edit?",
        options,
        PendingOperation::EditSpawn(request),
        true,
    ))
}

/// Rename an entity and update its aliases.
pub(crate) fn edit_entity(
    ctx: &mut CommandContext<'_>,
    entity: &str,
    request: &EditRequest,
) -> BotResult<String> {
    let current = ctx
        .session
        .tracker
        .catalog()
        .entity(entity)
        .map(|config| config.aliases.clone())
        .ok_or_else(|| {
            BotError::validation(EDIT_FAILED, format!("{entity} is not a recognized boss or alias"))
        })?;
    let new_name = request.new_name.clone().unwrap_or_else(|| entity.to_string());
    ctx.session
        .tracker
        .update_entity(entity, &new_name, request.aliases_for(&current))
        .reject_as(EDIT_FAILED)?;
    Ok(format!("Successfully applied edits: {}", describe(ctx, &new_name)))
}

/// Apply an edit that touches one spawn's map or respawn bounds.
pub(crate) fn edit_spawn(
    ctx: &mut CommandContext<'_>,
    key: &SpawnKey,
    request: &EditRequest,
) -> BotResult<String> {
    let catalog = ctx.session.tracker.catalog();
    let (Some(rule), Some(config)) = (catalog.rule(key), catalog.entity(&key.entity)) else {
        return Err(BotError::validation(
            EDIT_FAILED,
            format!("{key} is no longer a trackable spawn"),
        ));
    };
    let aliases = request.aliases_for(&config.aliases);
    let rule = SpawnRule::new(
        request.new_min.unwrap_or(rule.min),
        request.new_max.unwrap_or(rule.max),
    )
    .reject_as(EDIT_FAILED)?;
    let location = request
        .new_map
        .clone()
        .unwrap_or_else(|| key.location.clone());
    let new_name = request
        .new_name
        .clone()
        .unwrap_or_else(|| key.entity.clone());

    ctx.session
        .tracker
        .update_spawn(key, &new_name, &location, rule, aliases)
        .reject_as(EDIT_FAILED)?;
    Ok(format!("Successfully applied edits: {}", describe(ctx, &new_name)))
}

pub async fn remove(ctx: &mut CommandContext<'_>, args: &[String]) -> BotResult<String> {
    let name = match args {
        [] => return Err(BotError::validation(REMOVE_FAILED, "no boss given")),
        [name] => name,
        _ => {
            return Err(BotError::validation(
                REMOVE_FAILED,
                "expected exactly one argument",
            ))
        }
    };
    let catalog = ctx.session.tracker.catalog();
    let entities = catalog.resolve(name);
    if entities.is_empty() {
        return Err(BotError::validation(
            REMOVE_FAILED,
            format!("{name} is not a recognized boss or alias"),
        ));
    }
    if catalog.is_unambiguous(&entities) {
        if let Some(key) = catalog.first_spawn(&entities) {
            return remove_spawn(ctx, &key).await;
        }
    }
    let options = catalog
        .spawn_options(&entities)
        .into_iter()
        .map(|(label, key)| (label, ChoiceValue::Spawn(key)))
        .collect();
    Ok(ctx.prompt(
        "Which spawn to remove?",
        options,
        PendingOperation::Remove,
        true,
    ))
}

/// Remove one spawn, refreshing the board if it was on it.
pub(crate) async fn remove_spawn(ctx: &mut CommandContext<'_>, key: &SpawnKey) -> BotResult<String> {
    let label = ctx.session.tracker.label(key);
    let removed = ctx
        .session
        .tracker
        .remove_spawn(key)
        .reject_as(REMOVE_FAILED)?;
    if removed.entity_removed {
        tracing::info!("Group {} removed boss {}", ctx.session.id(), key.entity);
    }
    if removed.was_tracked {
        ctx.refresh().await?;
    }
    Ok(format!("{label} is no longer trackable."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edits(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_parse_edit_request() {
        let request = EditRequest::parse(&edits(&[
            "MIN=30",
            "max=50",
            "map=Inner_Pyramid",
            "name=Amon_Ra",
            "aliases+=Gold,gtb",
            "aliases-=silver",
        ]))
        .unwrap();
        assert_eq!(request.new_min, Some(30));
        assert_eq!(request.new_max, Some(50));
        assert_eq!(request.new_map.as_deref(), Some("Inner Pyramid"));
        assert_eq!(request.new_name.as_deref(), Some("Amon Ra"));
        assert!(request.add_aliases.contains("gold"));
        assert!(request.remove_aliases.contains("silver"));
        assert!(request.touches_spawn());
    }

    #[test]
    fn test_parse_edit_rejections() {
        let reason = |words: &[&str]| EditRequest::parse(&edits(words)).unwrap_err().to_string();
        assert_eq!(
            reason(&["min"]),
            "Failed to edit: min is not formatted correctly (should be property=new)"
        );
        assert_eq!(
            reason(&["aliases=a=b"]),
            "Failed to edit: aliases=a=b is not formatted correctly (should be property=new)"
        );
        assert_eq!(reason(&["min=x"]), "Failed to edit: expected integer for min respawn time");
        assert_eq!(reason(&["max=0"]), "Failed to edit: max respawn time must be positive");
        assert_eq!(reason(&["aliases*=x"]), "Failed to edit: unrecognized property \"aliases*\"");
        assert_eq!(reason(&["colour=red"]), "Failed to edit: unrecognized property \"colour\"");
        assert_eq!(
            reason(&["aliases=a", "aliases+=b"]),
            "Failed to edit: cannot set aliases and add/remove aliases at the same time"
        );
    }

    #[test]
    fn test_alias_arithmetic() {
        let current = vec!["ol".to_string(), "orclord".to_string()];
        let request = EditRequest::parse(&edits(&["aliases+=lord", "aliases-=ol"])).unwrap();
        let aliases: Vec<_> = request.aliases_for(&current).into_iter().collect();
        assert_eq!(aliases, vec!["lord", "orclord"]);
        assert!(!request.touches_spawn());

        let request = EditRequest::parse(&edits(&["aliases=x,y"])).unwrap();
        assert_eq!(request.aliases_for(&current).len(), 2);
        let request = EditRequest::parse(&edits(&["aliases="])).unwrap();
        assert!(request.aliases_for(&current).is_empty());
    }

    #[test]
    fn test_parse_bound() {
        assert_eq!(parse_bound("min", "60").unwrap(), 60);
        assert_eq!(
            parse_bound("min", "sixty").unwrap_err().to_string(),
            "Failed to add boss: given min respawn time \"sixty\" is not an integer"
        );
        assert_eq!(
            parse_bound("max", "-1").unwrap_err().to_string(),
            "Failed to add boss: given max respawn time is negative"
        );
    }
}
