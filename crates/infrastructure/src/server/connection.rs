use super::stats::ProxyStats;
use crate::dns::framing::{read_frame, write_frame, FrameRead};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tldns_application::use_cases::{HandleQueryUseCase, QueryOutcome};
use tldns_domain::{DomainError, Session, SessionState};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound on sending close_notify to a peer that stopped reading.
const CLOSE_NOTIFY_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum CloseReason {
    ClientClosed,
    IdleTimeout,
    Shutdown,
    Protocol(DomainError),
    Io(DomainError),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientClosed => f.write_str("client closed"),
            Self::IdleTimeout => f.write_str("idle timeout"),
            Self::Shutdown => f.write_str("server shutdown"),
            Self::Protocol(e) => write!(f, "protocol violation: {}", e),
            Self::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

#[derive(Debug)]
pub struct SessionSummary {
    pub peer: SocketAddr,
    pub queries: u64,
    pub reason: CloseReason,
}

/// Drives one DNS-over-TLS session: frames are read, answered and written
/// strictly one at a time, so responses leave in the order queries arrived.
#[derive(Clone)]
pub struct ConnectionHandler {
    use_case: Arc<HandleQueryUseCase>,
    stats: Arc<ProxyStats>,
    shutdown: CancellationToken,
    idle_timeout: Duration,
}

impl ConnectionHandler {
    pub fn new(
        use_case: Arc<HandleQueryUseCase>,
        stats: Arc<ProxyStats>,
        shutdown: CancellationToken,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            use_case,
            stats,
            shutdown,
            idle_timeout,
        }
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub async fn run<S>(&self, mut stream: S, peer: SocketAddr) -> SessionSummary
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let _active = self.stats.session_opened();
        let mut session = Session::new(peer);
        info!(peer = %peer, "New connection");

        let reason = self.serve_session(&mut stream, &mut session).await;
        session.close();

        let _ = tokio::time::timeout(CLOSE_NOTIFY_TIMEOUT, stream.shutdown()).await;

        info!(
            peer = %peer,
            queries = session.queries(),
            duration_ms = session.elapsed().as_millis() as u64,
            reason = %reason,
            "Connection closed"
        );

        SessionSummary {
            peer,
            queries: session.queries(),
            reason,
        }
    }

    async fn serve_session<S>(&self, stream: &mut S, session: &mut Session) -> CloseReason
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let peer = session.peer();

        loop {
            // Shutdown is only observed between queries; an in-flight
            // exchange always completes or times out first.
            let read = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return CloseReason::Shutdown,
                read = tokio::time::timeout(self.idle_timeout, read_frame(stream)) => read,
            };

            let read = match read {
                Ok(read) => read,
                Err(_) => {
                    debug!(
                        peer = %peer,
                        idle_ms = self.idle_timeout.as_millis() as u64,
                        "No query within the idle timeout, closing session"
                    );
                    return CloseReason::IdleTimeout;
                }
            };

            let payload = match read {
                Ok(FrameRead::Frame(payload)) => payload,
                Ok(FrameRead::Eof) => return CloseReason::ClientClosed,
                Err(e @ DomainError::ConnectionIo(_)) => return CloseReason::Io(e),
                Err(e) => {
                    warn!(peer = %peer, error = %e, "Framing error, closing session");
                    self.stats.record_dropped();
                    return CloseReason::Protocol(e);
                }
            };

            let query_number = session.record_query();
            self.stats.record_query();
            advance(session, SessionState::Decoding);

            let outcome = match self.use_case.decode(payload) {
                Ok(query) => {
                    advance(session, SessionState::Forwarding);
                    debug!(
                        peer = %peer,
                        query_number,
                        id = query.id,
                        rd = query.recursion_desired(),
                        question = %query.describe(),
                        "Forwarding query"
                    );
                    advance(session, SessionState::AwaitingUpstream);
                    self.use_case.forward(&query).await
                }
                Err(outcome) => outcome,
            };

            self.stats.record_outcome(&outcome);

            let response = match outcome {
                QueryOutcome::Answered(response) | QueryOutcome::ServFail { response, .. } => {
                    response
                }
                QueryOutcome::Drop(e) => {
                    warn!(peer = %peer, error = %e, "Query has no recoverable id, closing session");
                    return CloseReason::Protocol(e);
                }
            };

            advance(session, SessionState::Replying);
            if let Err(e) = write_frame(stream, &response).await {
                debug!(peer = %peer, error = %e, "Failed to write response");
                return CloseReason::Io(e);
            }
            advance(session, SessionState::AwaitingFrame);
        }
    }
}

/// The handler only ever walks the documented cycle; a rejected transition
/// is a bug in `serve_session`.
fn advance(session: &mut Session, next: SessionState) {
    let from = session.state();
    let moved = session.transition(next);
    debug_assert!(moved, "invalid session transition {} -> {}", from, next);
}
