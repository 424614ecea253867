use super::connection::CloseReason;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tldns_application::use_cases::QueryOutcome;

/// Process-wide counters, shared by the accept loop and every session.
#[derive(Debug, Default)]
pub struct ProxyStats {
    connections_accepted: AtomicU64,
    handshake_failures: AtomicU64,
    active_sessions: AtomicU64,
    queries_total: AtomicU64,
    answered_total: AtomicU64,
    servfail_total: AtomicU64,
    dropped_total: AtomicU64,
    closed_by_client: AtomicU64,
    closed_idle: AtomicU64,
    closed_by_shutdown: AtomicU64,
    closed_protocol: AtomicU64,
    closed_io: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub connections_accepted: u64,
    pub handshake_failures: u64,
    pub active_sessions: u64,
    pub queries_total: u64,
    pub answered_total: u64,
    pub servfail_total: u64,
    pub dropped_total: u64,
    pub closed_by_client: u64,
    pub closed_idle: u64,
    pub closed_by_shutdown: u64,
    pub closed_protocol: u64,
    pub closed_io: u64,
}

impl ProxyStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_accepted(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handshake_failure(&self) {
        self.handshake_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query(&self) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, outcome: &QueryOutcome) {
        let counter = match outcome {
            QueryOutcome::Answered(_) => &self.answered_total,
            QueryOutcome::ServFail { .. } => &self.servfail_total,
            QueryOutcome::Drop(_) => &self.dropped_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Framing violations close the session without a reply.
    pub fn record_dropped(&self) {
        self.dropped_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_close(&self, reason: &CloseReason) {
        let counter = match reason {
            CloseReason::ClientClosed => &self.closed_by_client,
            CloseReason::IdleTimeout => &self.closed_idle,
            CloseReason::Shutdown => &self.closed_by_shutdown,
            CloseReason::Protocol(_) => &self.closed_protocol,
            CloseReason::Io(_) => &self.closed_io,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts the session as active until the guard is dropped.
    pub fn session_opened(self: &Arc<Self>) -> ActiveSessionGuard {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
        ActiveSessionGuard {
            stats: Arc::clone(self),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            handshake_failures: self.handshake_failures.load(Ordering::Relaxed),
            active_sessions: self.active_sessions.load(Ordering::Relaxed),
            queries_total: self.queries_total.load(Ordering::Relaxed),
            answered_total: self.answered_total.load(Ordering::Relaxed),
            servfail_total: self.servfail_total.load(Ordering::Relaxed),
            dropped_total: self.dropped_total.load(Ordering::Relaxed),
            closed_by_client: self.closed_by_client.load(Ordering::Relaxed),
            closed_idle: self.closed_idle.load(Ordering::Relaxed),
            closed_by_shutdown: self.closed_by_shutdown.load(Ordering::Relaxed),
            closed_protocol: self.closed_protocol.load(Ordering::Relaxed),
            closed_io: self.closed_io.load(Ordering::Relaxed),
        }
    }
}

pub struct ActiveSessionGuard {
    stats: Arc<ProxyStats>,
}

impl Drop for ActiveSessionGuard {
    fn drop(&mut self) {
        self.stats.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }
}
