pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use bytes::Bytes;
use tldns_domain::{DomainError, UpstreamTransportKind};
use tokio::time::Instant;

pub use tcp::TcpTransport;
pub use udp::UdpTransport;

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Bytes,

    pub protocol_used: UpstreamTransportKind,
}

#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Sends one message and waits for one reply, giving up at `deadline`.
    async fn send(
        &self,
        message_bytes: &[u8],
        deadline: Instant,
    ) -> Result<TransportResponse, DomainError>;
}

/// Maps the elapsed case of `tokio::time::timeout_at` onto the domain error.
pub(crate) fn timed_out(server: std::net::SocketAddr) -> DomainError {
    DomainError::Timeout {
        server: server.to_string(),
    }
}
