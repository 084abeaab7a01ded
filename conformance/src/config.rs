//! Server configuration.

use crate::HandoffMode;

pub const DEFAULT_CONTROL_ADDR: &str = "0.0.0.0:2342";
pub const DEFAULT_PROTOCOL_ADDR: &str = "0.0.0.0:4223";

/// Largest request frame a session will read.
pub const DEFAULT_MAX_MESSAGE_SIZE: u32 = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Where drivers send scenario names.
    pub control_addr: String,
    /// Where clients under test speak 9P.
    pub protocol_addr: String,
    pub handoff: HandoffMode,
    pub max_message_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            control_addr: DEFAULT_CONTROL_ADDR.to_string(),
            protocol_addr: DEFAULT_PROTOCOL_ADDR.to_string(),
            handoff: HandoffMode::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Both listeners on an ephemeral loopback port.
    pub fn loopback() -> Self {
        Self {
            control_addr: "127.0.0.1:0".to_string(),
            protocol_addr: "127.0.0.1:0".to_string(),
            ..Self::default()
        }
    }

    pub fn with_handoff(mut self, handoff: HandoffMode) -> Self {
        self.handoff = handoff;
        self
    }
}
