use super::connection::ConnectionHandler;
use super::stats::ProxyStats;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tldns_application::use_cases::HandleQueryUseCase;
use tldns_domain::DomainError;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const LISTEN_BACKLOG: i32 = 1024;
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause after a failed accept (e.g. EMFILE) before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// TLS listener. Owns the accept loop and every session it spawns.
pub struct DotServer {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    use_case: Arc<HandleQueryUseCase>,
    stats: Arc<ProxyStats>,
    handshake_timeout: Duration,
    idle_timeout: Duration,
    shutdown_grace: Duration,
}

impl DotServer {
    /// Binds the listening socket. Must be called inside a tokio runtime.
    pub fn bind(
        bind_addr: SocketAddr,
        acceptor: TlsAcceptor,
        use_case: Arc<HandleQueryUseCase>,
    ) -> Result<Self, DomainError> {
        let listener = create_tcp_listener(bind_addr).map_err(|e| DomainError::Bind {
            addr: bind_addr.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            listener,
            acceptor,
            use_case,
            stats: ProxyStats::new(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        })
    }

    pub fn with_timeouts(mut self, handshake_timeout: Duration, shutdown_grace: Duration) -> Self {
        self.handshake_timeout = handshake_timeout;
        self.shutdown_grace = shutdown_grace;
        self
    }

    /// Sessions that stay silent this long between queries are closed.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DomainError> {
        self.listener
            .local_addr()
            .map_err(|e| DomainError::ConnectionIo(e.to_string()))
    }

    pub fn stats(&self) -> Arc<ProxyStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts connections until `shutdown` is cancelled, then drains the
    /// live sessions within the grace period.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<(), DomainError> {
        let local_addr = self.local_addr()?;
        info!(
            bind_address = %local_addr,
            upstream = %self.use_case.upstream(),
            query_timeout_ms = self.use_case.query_timeout().as_millis() as u64,
            "DNS-over-TLS server listening"
        );

        let Self {
            listener,
            acceptor,
            use_case,
            stats,
            handshake_timeout,
            idle_timeout,
            shutdown_grace,
        } = self;

        let mut sessions: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!(error = %e, "Session task panicked");
                        }
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((tcp, peer)) => {
                        stats.record_accepted();
                        let handler = ConnectionHandler::new(
                            Arc::clone(&use_case),
                            Arc::clone(&stats),
                            shutdown.child_token(),
                            idle_timeout,
                        );
                        let session = PendingSession {
                            acceptor: acceptor.clone(),
                            handler,
                            stats: Arc::clone(&stats),
                            handshake_timeout,
                        };
                        sessions.spawn(session.run(tcp, peer));
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }
        }

        drop(listener);
        drain(&mut sessions, shutdown_grace).await;

        info!("DNS-over-TLS server stopped");
        Ok(())
    }
}

struct PendingSession {
    acceptor: TlsAcceptor,
    handler: ConnectionHandler,
    stats: Arc<ProxyStats>,
    handshake_timeout: Duration,
}

impl PendingSession {
    async fn run(self, tcp: TcpStream, peer: SocketAddr) {
        if let Err(e) = tcp.set_nodelay(true) {
            debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        let handshake = tokio::time::timeout(self.handshake_timeout, self.acceptor.accept(tcp));
        let result = tokio::select! {
            _ = self.handler_shutdown() => return,
            result = handshake => result,
        };

        let tls = match result {
            Ok(Ok(tls)) => tls,
            Ok(Err(e)) => return self.handshake_failed(peer, e.to_string()),
            Err(_) => {
                return self.handshake_failed(
                    peer,
                    format!("timed out after {:?}", self.handshake_timeout),
                )
            }
        };

        debug!(peer = %peer, "TLS handshake complete");
        let summary = self.handler.run(tls, peer).await;
        self.stats.record_close(&summary.reason);
    }

    async fn handler_shutdown(&self) {
        self.handler.shutdown_token().cancelled().await
    }

    fn handshake_failed(&self, peer: SocketAddr, reason: String) {
        self.stats.record_handshake_failure();
        let error = DomainError::Handshake { peer, reason };
        warn!(peer = %peer, error = %error, "TLS handshake failed");
    }
}

/// Waits for sessions to finish their current cycle, then aborts the rest.
async fn drain(sessions: &mut JoinSet<()>, grace: Duration) {
    if sessions.is_empty() {
        return;
    }

    info!(
        sessions = sessions.len(),
        grace_ms = grace.as_millis() as u64,
        "Waiting for open sessions to close"
    );

    let drained = tokio::time::timeout(grace, async {
        while sessions.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(
            remaining = sessions.len(),
            "Grace period elapsed, aborting remaining sessions"
        );
        sessions.abort_all();
        while sessions.join_next().await.is_some() {}
    }
}

fn create_tcp_listener(socket_addr: SocketAddr) -> io::Result<TcpListener> {
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    // SO_REUSEADDR only: a second instance on the same port must fail.
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
