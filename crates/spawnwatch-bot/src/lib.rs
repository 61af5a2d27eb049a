//! Spawnwatch bot: chat commands, per-group respawn boards and alerts on top
//! of the `spawnwatch` engine.

pub mod commands;
pub mod config;
pub mod gateway;
pub mod protocol;
pub mod render;
pub mod repl;
pub mod scheduler;
pub mod services;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

pub use config::resolve_state_path;
pub use gateway::{LocalGateway, MessagingGateway};
pub use protocol::Dispatcher;
pub use services::Services;
pub use session::GroupRegistry;
pub use transport::StdioTransport;
