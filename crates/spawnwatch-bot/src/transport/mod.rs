//! JSON-lines transport between the bot and a local chat bridge.

pub mod framing;
pub mod stdio;

pub use stdio::StdioTransport;
