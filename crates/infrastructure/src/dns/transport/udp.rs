//! UDP Transport for DNS queries (RFC 1035 §4.2.1)
//!
//! Messages are sent as-is, one ephemeral socket per exchange. If the reply
//! has the TC (truncated) bit set, the caller retries over TCP.

use super::{timed_out, DnsTransport, TransportResponse};
use async_trait::async_trait;
use bytes::Bytes;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tldns_domain::{DomainError, UpstreamTransportKind};
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

/// Largest datagram the upstream can send. Anything it answers without TC
/// must arrive whole, whatever EDNS(0) size the client advertised.
const MAX_UDP_RESPONSE_SIZE: usize = 65535;

/// DNS over UDP transport
pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn bind_addr(&self) -> SocketAddr {
        if self.server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        deadline: Instant,
    ) -> Result<TransportResponse, DomainError> {
        let socket = UdpSocket::bind(self.bind_addr()).await.map_err(|e| {
            DomainError::UpstreamIo(format!("Failed to bind UDP socket: {}", e))
        })?;

        // A connected socket drops datagrams from any other source and
        // surfaces ICMP port-unreachable as a recv error.
        socket.connect(self.server_addr).await.map_err(|e| {
            DomainError::UpstreamIo(format!(
                "Failed to connect UDP socket to {}: {}",
                self.server_addr, e
            ))
        })?;

        let bytes_sent = timeout_at(deadline, socket.send(message_bytes))
            .await
            .map_err(|_| timed_out(self.server_addr))?
            .map_err(|e| {
                DomainError::UpstreamIo(format!(
                    "Failed to send UDP query to {}: {}",
                    self.server_addr, e
                ))
            })?;

        debug!(
            server = %self.server_addr,
            bytes_sent = bytes_sent,
            "UDP query sent"
        );

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];

        let bytes_received = timeout_at(deadline, socket.recv(&mut recv_buf))
            .await
            .map_err(|_| timed_out(self.server_addr))?
            .map_err(|e| {
                DomainError::UpstreamIo(format!(
                    "Failed to receive UDP response from {}: {}",
                    self.server_addr, e
                ))
            })?;

        recv_buf.truncate(bytes_received);

        debug!(
            server = %self.server_addr,
            bytes_received = bytes_received,
            "UDP response received"
        );

        Ok(TransportResponse {
            bytes: Bytes::from(recv_buf),
            protocol_used: UpstreamTransportKind::Udp,
        })
    }
}

/// Rejects a reply whose transaction id differs from the query's.
pub fn validate_response_id(
    query: &[u8],
    response: &[u8],
    server: SocketAddr,
) -> Result<(), DomainError> {
    if query.len() < 2 || response.len() < 2 {
        return Err(DomainError::UpstreamIo(format!(
            "Message from {} too short to carry a transaction id",
            server
        )));
    }

    let query_id = u16::from_be_bytes([query[0], query[1]]);
    let response_id = u16::from_be_bytes([response[0], response[1]]);

    if query_id != response_id {
        return Err(DomainError::UpstreamIo(format!(
            "Transaction id mismatch from {}: sent {:#06x}, received {:#06x}",
            server, query_id, response_id
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "udp_test.rs"]
mod tests;
