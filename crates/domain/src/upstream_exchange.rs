use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamTransportKind {
    Udp,
    Tcp,
}

impl UpstreamTransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "UDP",
            Self::Tcp => "TCP",
        }
    }
}

/// One forwarding attempt for one query. The deadline covers the whole
/// exchange, including a TCP fallback after a truncated UDP answer.
#[derive(Debug, Clone)]
pub struct UpstreamExchange {
    pub upstream: SocketAddr,
    pub deadline: Instant,
    pub transport: UpstreamTransportKind,
}

impl UpstreamExchange {
    pub fn with_deadline(upstream: SocketAddr, deadline: Instant) -> Self {
        Self {
            upstream,
            deadline,
            transport: UpstreamTransportKind::Udp,
        }
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn switch_to_tcp(&mut self) {
        self.transport = UpstreamTransportKind::Tcp;
    }
}
