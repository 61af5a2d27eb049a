//! Inbound message handling: prompt replies, command routing, replies.

pub mod dispatcher;

pub use dispatcher::Dispatcher;
