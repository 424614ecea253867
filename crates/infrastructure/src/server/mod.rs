pub mod connection;
pub mod listener;
pub mod stats;

pub use connection::{CloseReason, ConnectionHandler, SessionSummary};
pub use listener::DotServer;
pub use stats::{ProxyStats, StatsSnapshot};

use crate::dns::{DnsForwarder, HickoryDnsCodec};
use crate::tls;
use std::net::SocketAddr;
use std::sync::Arc;
use tldns_application::use_cases::HandleQueryUseCase;
use tldns_domain::{Config, DomainError};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Builds every component from `config` and binds the listener.
///
/// Credentials are loaded before the port is taken, so either failure leaves
/// nothing half-started.
pub async fn build_server(config: &Config) -> Result<DotServer, DomainError> {
    let acceptor = tls::build_acceptor(&config.tls.cert_path, &config.tls.key_path)?;

    let upstream_addr = resolve(&config.upstream.endpoint()).await?;
    info!(
        upstream = %config.upstream.endpoint(),
        resolved = %upstream_addr,
        "Upstream resolver configured"
    );

    let use_case = Arc::new(HandleQueryUseCase::new(
        Arc::new(HickoryDnsCodec::new()),
        Arc::new(DnsForwarder::new(upstream_addr)),
        config.upstream.query_timeout(),
    ));

    let bind_addr = resolve(&config.server.endpoint()).await?;
    let server = DotServer::bind(bind_addr, acceptor, use_case)?
        .with_timeouts(config.server.handshake_timeout(), config.server.shutdown_grace())
        .with_idle_timeout(config.server.idle_timeout());

    Ok(server)
}

pub async fn serve(config: &Config, shutdown: CancellationToken) -> Result<(), DomainError> {
    build_server(config).await?.serve(shutdown).await
}

/// Resolves `host:port` once, at startup. The first address wins.
async fn resolve(endpoint: &str) -> Result<SocketAddr, DomainError> {
    tokio::net::lookup_host(endpoint)
        .await
        .map_err(|e| DomainError::Config(format!("Failed to resolve '{}': {}", endpoint, e)))?
        .next()
        .ok_or_else(|| DomainError::Config(format!("'{}' resolved to no addresses", endpoint)))
}
