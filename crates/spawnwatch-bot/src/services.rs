//! Handles shared by the dispatcher, commands and background tasks.

use std::sync::Arc;

use crate::gateway::MessagingGateway;
use crate::session::GroupRegistry;

#[derive(Clone)]
pub struct Services {
    pub gateway: Arc<dyn MessagingGateway>,
    pub registry: Arc<GroupRegistry>,
}

impl Services {
    pub fn new(gateway: Arc<dyn MessagingGateway>, registry: Arc<GroupRegistry>) -> Self {
        Self { gateway, registry }
    }

    /// Current session-clock reading, in minutes.
    pub fn now(&self) -> f64 {
        spawnwatch::format::session_minutes(self.gateway.current_timestamp())
    }
}
