//! Interactive console for spawnwatch-bot.
//!
//! Launch with `spawnwatch-bot repl`. Chat lines (`!t amon 5`, or a number
//! answering a prompt) are posted to a local group as a group manager; lines
//! starting with `/` control the console. Type `/help` for the list.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};

use spawnwatch::format::session_minutes;

use crate::commands::CommandRegistry;
use crate::gateway::{LocalGateway, OutboundAction};
use crate::protocol::Dispatcher;
use crate::scheduler;
use crate::services::Services;
use crate::session::GroupRegistry;
use crate::types::{Author, Content, InboundMessage};

/// The console's group, and the channels it talks and posts the board in.
const CONSOLE_GROUP: u64 = 1;
const CONSOLE_CHANNEL: u64 = 1;
const BOARD_CHANNEL: u64 = 2;
const CONSOLE_USER: u64 = 1;

/// Console commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/board", "Show the board channel"),
    ("/commands", "List chat commands"),
    ("/clear", "Clear the screen"),
    ("/help", "Show console commands"),
    ("/exit", "Quit the console"),
];

/// Tab completion for console commands and `!` chat commands.
struct ConsoleHelper {
    chat_commands: Vec<String>,
}

impl ConsoleHelper {
    fn new() -> Self {
        Self {
            chat_commands: CommandRegistry::list_commands()
                .iter()
                .map(|command| format!("!{}", command.name))
                .collect(),
        }
    }

    fn candidates<'a>(&'a self, input: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let console = COMMANDS.iter().map(|(cmd, desc)| (*cmd, *desc));
        let chat = self.chat_commands.iter().map(|cmd| (cmd.as_str(), ""));
        console
            .chain(chat)
            .filter(move |(cmd, _)| cmd.starts_with(input))
    }
}

impl Completer for ConsoleHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];
        if input.contains(' ') {
            return Ok((pos, Vec::new()));
        }
        let matches = self
            .candidates(input)
            .map(|(cmd, desc)| Pair {
                display: format!("{cmd:<22} {desc}"),
                replacement: format!("{cmd} "),
            })
            .collect();
        Ok((0, matches))
    }
}

impl Hinter for ConsoleHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.len() < 2 || line.contains(' ') {
            return None;
        }
        self.candidates(line)
            .find(|(cmd, _)| *cmd != line)
            .map(|(cmd, _)| cmd[line.len()..].to_string())
    }
}

impl Highlighter for ConsoleHelper {}
impl Validator for ConsoleHelper {}
impl Helper for ConsoleHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// Run async work from the blocking console loop.
fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

struct Console {
    dispatcher: Dispatcher,
    gateway: Arc<LocalGateway>,
    author: Author,
}

/// Run the interactive console against the state document at `state_path`.
/// Needs a multi-threaded runtime.
pub fn run(state_path: &str) -> anyhow::Result<()> {
    let gateway = Arc::new(LocalGateway::new());
    let registry = GroupRegistry::open(state_path, session_minutes(Utc::now()))?;
    let services = Services::new(gateway.clone(), Arc::new(registry));
    let (shared, _) = services
        .registry
        .get_or_create(CONSOLE_GROUP, services.now())?;
    block_on(async {
        let mut group = shared.lock().await;
        if group.config.channel.is_none() {
            group.set_channel(BOARD_CHANNEL);
        }
    });
    block_on(scheduler::restore(&services))?;

    let console = Console {
        dispatcher: Dispatcher::new(services),
        gateway,
        author: Author {
            id: CONSOLE_USER,
            name: "console".to_string(),
            manage_group: true,
        },
    };

    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mspawnwatch-bot v{}\x1b[0m \x1b[90m(state: {state_path})\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Type chat commands like \x1b[36m!t-help\x1b[0m, \x1b[90m/help\x1b[0m for console commands, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<ConsoleHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(ConsoleHelper::new()));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".spawnwatch_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let prompt = " \x1b[36mspawnwatch>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let Some(command) = line.strip_prefix('/') else {
                    console.post(line);
                    continue;
                };
                match command.split_whitespace().next().unwrap_or("") {
                    "exit" | "quit" => {
                        eprintln!("  Goodbye!");
                        break;
                    }
                    "" | "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "board" => console.print_board(),
                    "commands" => cmd_commands(),
                    other => {
                        eprintln!("  Unknown command '/{other}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);

    Ok(())
}

impl Console {
    /// Post a chat line and print the replies, then the board if it changed.
    fn post(&self, line: &str) {
        let message = InboundMessage {
            group: CONSOLE_GROUP,
            channel: CONSOLE_CHANNEL,
            author: self.author.clone(),
            content: line.to_string(),
            timestamp: Utc::now(),
        };
        self.gateway.record_inbound(&message);
        match block_on(self.dispatcher.handle_message(&message)) {
            Ok(replies) => {
                for reply in replies {
                    println!("{reply}");
                }
            }
            Err(e) => eprintln!("  Error: {e}"),
        }

        let board_changed = self.gateway.take_actions().iter().any(|action| {
            matches!(
                action,
                OutboundAction::Send { channel: BOARD_CHANNEL, .. }
                    | OutboundAction::Edit { channel: BOARD_CHANNEL, .. }
            )
        });
        if board_changed {
            self.print_board();
        }
    }

    fn print_board(&self) {
        let messages = self.gateway.messages(BOARD_CHANNEL);
        if messages.is_empty() {
            eprintln!("  The board is empty. Track something with !t <name>.");
            return;
        }
        println!();
        for (_, content) in messages {
            println!("{}", render_content(&content));
        }
    }
}

/// Plain-text rendering of a message for the terminal.
fn render_content(content: &Content) -> String {
    match content {
        Content::Text { text } => text.clone(),
        Content::Rich { fields } => fields
            .iter()
            .map(|field| format!("\x1b[1m{}\x1b[0m\n{}", field.name.trim(), field.value))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Console commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Anything else is posted to the group, e.g. !t-help.");
    eprintln!();
}

fn cmd_commands() {
    let commands = CommandRegistry::list_commands();
    eprintln!();
    eprintln!("  {} chat commands:", commands.len());
    eprintln!();
    for command in &commands {
        let summary = command.usages.first().map_or("", |usage| usage.summary);
        eprintln!("    !{:<22} {summary}", command.name);
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RichField;

    #[test]
    fn test_render_rich_content() {
        let content = Content::Rich {
            fields: vec![RichField {
                name: "Alerts ".to_string(),
                value: "Amon Ra: prob > 0.5".to_string(),
            }],
        };
        assert_eq!(
            render_content(&content),
            "\x1b[1mAlerts\x1b[0m\nAmon Ra: prob > 0.5"
        );
        assert_eq!(render_content(&Content::text("hi")), "hi");
    }

    #[test]
    fn test_completion_candidates() {
        let helper = ConsoleHelper::new();
        let found: Vec<_> = helper.candidates("!track-a").map(|(cmd, _)| cmd).collect();
        assert!(found.contains(&"!track-add"));
        assert!(found.contains(&"!track-alert"));
        assert!(helper.candidates("/bo").any(|(cmd, _)| cmd == "/board"));
    }
}
