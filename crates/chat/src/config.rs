//! Chat core configuration

use std::env;
use std::time::Duration;

use crate::bridge::ReconnectPolicy;

/// Configuration for the chat core, loaded from environment variables
///
/// Reconnect defaults mirror the live channel collaborator's settings
/// (five attempts, one second apart).
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the REST message store
    pub api_base_url: String,
    /// URL of the live channel endpoint
    pub channel_url: String,
    /// Bounded reconnect attempts after a transport loss
    pub reconnect_attempts: usize,
    /// Fixed delay between reconnect attempts
    pub reconnect_delay: Duration,
}

impl ChatConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("CHAT_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/api".to_string()),
            channel_url: env::var("CHAT_CHANNEL_URL")
                .unwrap_or_else(|_| "ws://localhost:3000/ws".to_string()),
            reconnect_attempts: env::var("CHAT_RECONNECT_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            reconnect_delay: Duration::from_millis(
                env::var("CHAT_RECONNECT_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            ),
        }
    }

    /// Reconnect policy for the event bridge
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.reconnect_attempts,
            delay: self.reconnect_delay,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            channel_url: "ws://localhost:3000/ws".to_string(),
            reconnect_attempts: 5,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}
