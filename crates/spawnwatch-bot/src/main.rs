//! spawnwatch-bot: entry point.

use std::sync::Arc;

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use spawnwatch::format::session_minutes;
use spawnwatch::{default_catalog, EntityCatalog};

use spawnwatch_bot::commands::CommandRegistry;
use spawnwatch_bot::config::resolve_state_path;
use spawnwatch_bot::gateway::LocalGateway;
use spawnwatch_bot::protocol::Dispatcher;
use spawnwatch_bot::scheduler;
use spawnwatch_bot::services::Services;
use spawnwatch_bot::session::GroupRegistry;
use spawnwatch_bot::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "spawnwatch-bot",
    about = "Chat command service for boss respawn boards and alerts",
    version
)]
struct Cli {
    /// Path to the state document.
    #[arg(short, long)]
    state: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve JSON-lines message events over stdio (default).
    Serve {
        /// Path to the state document.
        #[arg(short, long)]
        state: Option<String>,
    },

    /// Launch the interactive console.
    Repl,

    /// Check that the state document loads.
    Validate,

    /// Print the trackable monsters of a group, or the built-in catalog.
    Catalog {
        /// Group id; omit for the built-in catalog.
        #[arg(short, long)]
        group: Option<u64>,
    },

    /// Print the chat commands as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   spawnwatch-bot completions bash > ~/.local/share/bash-completion/completions/spawnwatch-bot
    ///   spawnwatch-bot completions zsh > ~/.zfunc/_spawnwatch-bot
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn print_catalog(catalog: &EntityCatalog) {
    for entity in catalog.entities().keys() {
        if let Some(line) = catalog.describe(entity) {
            println!("{line}");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let now = session_minutes(Utc::now());

    match cli.command.unwrap_or(Commands::Serve { state: None }) {
        Commands::Serve { state } => {
            let state_path = resolve_state_path(state.or(cli.state).as_deref());
            tracing::info!("State: {state_path}");
            let registry = GroupRegistry::open(&state_path, now)?;

            let (sink, actions) = tokio::sync::mpsc::unbounded_channel();
            let gateway = Arc::new(LocalGateway::with_sink(sink));
            let services = Services::new(gateway.clone(), Arc::new(registry));
            scheduler::restore(&services).await?;

            let transport = StdioTransport::new(Dispatcher::new(services), gateway, actions);
            transport.run().await?;
        }

        Commands::Repl => {
            let state_path = resolve_state_path(cli.state.as_deref());
            spawnwatch_bot::repl::run(&state_path)?;
        }

        Commands::Validate => {
            let state_path = resolve_state_path(cli.state.as_deref());
            match GroupRegistry::open(&state_path, now) {
                Ok(registry) => {
                    println!("Valid state document: {state_path}");
                    println!("  Groups: {}", registry.count());
                    for (id, session) in registry.all()? {
                        let session = session.lock().await;
                        println!(
                            "  Group {id}: {} monsters, {} tracked, {} alerts",
                            session.tracker.catalog().len(),
                            session.tracker.store().len(),
                            session.tracker.rules().iter().count()
                        );
                    }
                }
                Err(e) => {
                    eprintln!("Invalid state document: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Catalog { group: None } => {
            print_catalog(&default_catalog()?);
        }

        Commands::Catalog { group: Some(group) } => {
            let state_path = resolve_state_path(cli.state.as_deref());
            let registry = GroupRegistry::open(&state_path, now)?;
            let Some(session) = registry.get(group)? else {
                eprintln!("No group {group} in {state_path}");
                std::process::exit(1);
            };
            print_catalog(session.lock().await.tracker.catalog());
        }

        Commands::Info => {
            let commands = CommandRegistry::list_commands();
            let info = serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "commands": commands,
                "command_count": commands.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "spawnwatch-bot", &mut std::io::stdout());
        }
    }

    Ok(())
}
