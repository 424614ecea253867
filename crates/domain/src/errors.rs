use crate::config::ConfigError;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Failed to bind listener on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("TLS credential error: {0}")]
    Credential(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TLS handshake with {peer} failed: {reason}")]
    Handshake { peer: SocketAddr, reason: String },

    #[error("Truncated frame: expected {expected} bytes, received {received}")]
    TruncatedFrame { expected: usize, received: usize },

    #[error("Zero-length frame")]
    EmptyFrame,

    #[error("Payload of {0} bytes cannot be framed (must be 1..=65535)")]
    InvalidFrameLength(usize),

    #[error("Failed to decode DNS message: {0}")]
    Decode(String),

    #[error("Query timeout waiting for upstream {server}")]
    Timeout { server: String },

    #[error("Upstream I/O error: {0}")]
    UpstreamIo(String),

    #[error("Failed to write frame: {0}")]
    Write(String),

    #[error("Connection I/O error: {0}")]
    ConnectionIo(String),
}

impl DomainError {
    /// Startup errors that must stop the process. Everything else is scoped to
    /// a single connection.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Bind { .. } | Self::Credential(_) | Self::Config(_)
        )
    }

    pub fn is_upstream_failure(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::UpstreamIo(_))
    }
}

impl From<ConfigError> for DomainError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
