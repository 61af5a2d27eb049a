//! Per-group state and the registry that owns it.

pub mod group;
pub mod registry;

pub use group::GroupSession;
pub use registry::{GroupRegistry, SharedSession};
