#![allow(dead_code)]
mod builders;
mod dns_server_mock;
mod dot_client;

pub use builders::*;
pub use dns_server_mock::{MockDnsServer, MockReply};
pub use dot_client::DotClient;
pub use tls::TestCredentials;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tldns_application::use_cases::HandleQueryUseCase;
use tldns_domain::DomainError;
use tldns_infrastructure::dns::{DnsForwarder, HickoryDnsCodec};
use tldns_infrastructure::server::{DotServer, ProxyStats};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct RunningProxy {
    pub addr: SocketAddr,
    pub stats: Arc<ProxyStats>,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<Result<(), DomainError>>,
    pub credentials: TestCredentials,
}

impl RunningProxy {
    pub async fn start(upstream: SocketAddr, query_timeout: Duration) -> Self {
        Self::start_with_idle_timeout(upstream, query_timeout, Duration::from_secs(30)).await
    }

    pub async fn start_with_idle_timeout(
        upstream: SocketAddr,
        query_timeout: Duration,
        idle_timeout: Duration,
    ) -> Self {
        let credentials = TestCredentials::generate();
        let use_case = Arc::new(HandleQueryUseCase::new(
            Arc::new(HickoryDnsCodec::new()),
            Arc::new(DnsForwarder::new(upstream)),
            query_timeout,
        ));

        let server = DotServer::bind(
            "127.0.0.1:0".parse().unwrap(),
            credentials.acceptor(),
            use_case,
        )
        .unwrap()
        .with_timeouts(Duration::from_secs(2), Duration::from_secs(2))
        .with_idle_timeout(idle_timeout);

        let addr = server.local_addr().unwrap();
        let stats = server.stats();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(server.serve(shutdown.clone()));

        Self {
            addr,
            stats,
            shutdown,
            handle,
            credentials,
        }
    }

    pub async fn client(&self) -> DotClient {
        DotClient::connect(self.addr, self.credentials.client_config()).await
    }

    pub async fn stop(self) -> Result<(), DomainError> {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop within the grace period")
            .expect("server task panicked")
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
