use serde::{Deserialize, Serialize};
use std::time::Duration;

/// RFC 7858 §3.1
pub const DEFAULT_DOT_PORT: u16 = 853;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,

    /// A session that sends no complete frame for this long is closed
    /// (RFC 7766 §6.2.3)
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// How long in-flight sessions get to finish after a shutdown signal
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl ServerConfig {
    pub fn endpoint(&self) -> String {
        if self.bind_address.contains(':') && !self.bind_address.starts_with('[') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            handshake_timeout_secs: default_handshake_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_DOT_PORT
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    30
}

fn default_shutdown_grace() -> u64 {
    5
}
