use async_trait::async_trait;
use bytes::Bytes;
use tldns_domain::{DnsQuery, DomainError};
use tokio::time::Instant;

#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Sends `query.raw` to the upstream resolver and returns the raw reply.
    ///
    /// Exactly one attempt is made. Returns `DomainError::Timeout` if nothing
    /// valid arrives before `deadline`, and `DomainError::UpstreamIo` for
    /// transport failures, malformed replies or a transaction id mismatch.
    async fn forward(&self, query: &DnsQuery, deadline: Instant) -> Result<Bytes, DomainError>;

    /// Human-readable upstream address, for logs.
    fn upstream(&self) -> String;
}
