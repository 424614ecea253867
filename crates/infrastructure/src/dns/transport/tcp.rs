//! TCP Transport for DNS queries (RFC 1035 §4.2.2, RFC 7766)
//!
//! Used when a UDP reply comes back truncated or the query itself does not
//! fit in a classic 512-byte datagram. One connection per exchange.

use super::{timed_out, DnsTransport, TransportResponse};
use crate::dns::framing::{read_frame, write_frame, FrameRead};
use async_trait::async_trait;
use std::net::SocketAddr;
use tldns_domain::{DomainError, UpstreamTransportKind};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    async fn connect(&self, deadline: Instant) -> Result<TcpStream, DomainError> {
        let stream = timeout_at(deadline, TcpStream::connect(self.server_addr))
            .await
            .map_err(|_| timed_out(self.server_addr))?
            .map_err(|e| {
                DomainError::UpstreamIo(format!(
                    "Connection refused by TCP server {}: {}",
                    self.server_addr, e
                ))
            })?;

        stream.set_nodelay(true).map_err(|e| {
            DomainError::UpstreamIo(format!(
                "Failed to set TCP_NODELAY on {}: {}",
                self.server_addr, e
            ))
        })?;

        Ok(stream)
    }

    /// Framing errors on the upstream leg are upstream failures, not
    /// client protocol violations.
    fn upstream_io(&self, e: DomainError) -> DomainError {
        DomainError::UpstreamIo(format!("TCP exchange with {} failed: {}", self.server_addr, e))
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        deadline: Instant,
    ) -> Result<TransportResponse, DomainError> {
        let mut stream = self.connect(deadline).await?;

        timeout_at(deadline, write_frame(&mut stream, message_bytes))
            .await
            .map_err(|_| timed_out(self.server_addr))?
            .map_err(|e| self.upstream_io(e))?;

        debug!(
            server = %self.server_addr,
            bytes_sent = message_bytes.len(),
            "TCP query sent"
        );

        let read = timeout_at(deadline, read_frame(&mut stream))
            .await
            .map_err(|_| timed_out(self.server_addr))?
            .map_err(|e| self.upstream_io(e))?;

        let bytes = match read {
            FrameRead::Frame(bytes) => bytes,
            FrameRead::Eof => {
                return Err(DomainError::UpstreamIo(format!(
                    "TCP server {} closed the connection without replying",
                    self.server_addr
                )))
            }
        };

        debug!(
            server = %self.server_addr,
            bytes_received = bytes.len(),
            "TCP response received"
        );

        Ok(TransportResponse {
            bytes,
            protocol_used: UpstreamTransportKind::Tcp,
        })
    }
}
