use super::response_parser::ResponseParser;
use crate::dns::transport::udp::validate_response_id;
use crate::dns::transport::{DnsTransport, TcpTransport, TransportResponse, UdpTransport};
use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use tldns_application::ports::UpstreamClient;
use tldns_domain::{DnsQuery, DomainError, UpstreamExchange, UpstreamTransportKind};
use tokio::time::Instant;
use tracing::debug;

/// Largest query sent over UDP without EDNS(0) negotiation (RFC 1035 §2.3.4).
pub const MAX_UDP_QUERY_SIZE: usize = 512;

/// Forwards raw client queries to a single upstream resolver.
///
/// UDP first, TCP when the reply is truncated or the query is too large for
/// a datagram. One attempt per query; the caller's deadline bounds both legs.
pub struct DnsForwarder {
    server_addr: SocketAddr,
    udp: UdpTransport,
    tcp: TcpTransport,
}

impl DnsForwarder {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self {
            server_addr,
            udp: UdpTransport::new(server_addr),
            tcp: TcpTransport::new(server_addr),
        }
    }

    fn transport(&self, kind: UpstreamTransportKind) -> &dyn DnsTransport {
        match kind {
            UpstreamTransportKind::Udp => &self.udp,
            UpstreamTransportKind::Tcp => &self.tcp,
        }
    }

    async fn exchange(
        &self,
        exchange: &UpstreamExchange,
        message_bytes: &[u8],
    ) -> Result<TransportResponse, DomainError> {
        let response = self
            .transport(exchange.transport)
            .send(message_bytes, exchange.deadline)
            .await?;

        validate_response_id(message_bytes, &response.bytes, exchange.upstream)?;
        Ok(response)
    }
}

#[async_trait]
impl UpstreamClient for DnsForwarder {
    async fn forward(&self, query: &DnsQuery, deadline: Instant) -> Result<Bytes, DomainError> {
        let mut exchange = UpstreamExchange::with_deadline(self.server_addr, deadline);
        if query.len() > MAX_UDP_QUERY_SIZE {
            exchange.switch_to_tcp();
        }

        let mut response = self.exchange(&exchange, &query.raw).await?;

        if response.protocol_used == UpstreamTransportKind::Udp
            && ResponseParser::is_truncated(&response.bytes)
        {
            debug!(
                id = query.id,
                server = %exchange.upstream,
                remaining_ms = exchange.remaining().as_millis() as u64,
                "Truncated UDP response, retrying over TCP"
            );
            exchange.switch_to_tcp();
            response = self.exchange(&exchange, &query.raw).await?;
        }

        let summary = ResponseParser::parse(&response.bytes)?;

        debug!(
            id = summary.id,
            server = %exchange.upstream,
            protocol = response.protocol_used.as_str(),
            rcode = %summary.rcode,
            truncated = summary.truncated,
            answers = summary.answer_count,
            "Upstream response validated"
        );

        Ok(response.bytes)
    }

    fn upstream(&self) -> String {
        self.server_addr.to_string()
    }
}
