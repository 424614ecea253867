use crate::ports::{DnsCodec, UpstreamClient};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tldns_domain::{DnsQuery, DomainError};
use tokio::time::Instant;
use tracing::{debug, warn};

/// What the session does with one framed payload.
#[derive(Debug)]
pub enum QueryOutcome {
    /// Upstream reply, relayed unchanged.
    Answered(Bytes),
    /// Synthesized SERVFAIL; `reason` is the failure it replaces.
    ServFail { response: Bytes, reason: DomainError },
    /// No transaction id is recoverable. Nothing can be sent back.
    Drop(DomainError),
}

impl QueryOutcome {
    pub fn response(&self) -> Option<&Bytes> {
        match self {
            Self::Answered(bytes) => Some(bytes),
            Self::ServFail { response, .. } => Some(response),
            Self::Drop(_) => None,
        }
    }

    pub fn is_servfail(&self) -> bool {
        matches!(self, Self::ServFail { .. })
    }
}

pub struct HandleQueryUseCase {
    codec: Arc<dyn DnsCodec>,
    upstream: Arc<dyn UpstreamClient>,
    query_timeout: Duration,
}

impl HandleQueryUseCase {
    pub fn new(
        codec: Arc<dyn DnsCodec>,
        upstream: Arc<dyn UpstreamClient>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            codec,
            upstream,
            query_timeout,
        }
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    pub fn upstream(&self) -> String {
        self.upstream.upstream()
    }

    /// Decodes a payload. On failure the error carries the outcome to send
    /// instead: a SERVFAIL if the id survived, otherwise a drop.
    pub fn decode(&self, payload: Bytes) -> Result<DnsQuery, QueryOutcome> {
        let recovered = self.codec.recover_id(&payload);

        match self.codec.decode_query(payload) {
            Ok(query) => Ok(query),
            Err(e) => match recovered {
                Some(id) => {
                    debug!(id, error = %e, "Undecodable query, answering SERVFAIL");
                    Err(QueryOutcome::ServFail {
                        response: self.codec.servfail_for_id(id),
                        reason: e,
                    })
                }
                None => {
                    debug!(error = %e, "Undecodable query without a transaction id");
                    Err(QueryOutcome::Drop(e))
                }
            },
        }
    }

    /// Single forwarding attempt. Any upstream failure becomes a SERVFAIL that
    /// carries the query's id and question.
    pub async fn forward(&self, query: &DnsQuery) -> QueryOutcome {
        let deadline = Instant::now() + self.query_timeout;

        let result = match tokio::time::timeout_at(deadline, self.upstream.forward(query, deadline))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(DomainError::Timeout {
                server: self.upstream.upstream(),
            }),
        };

        match result {
            Ok(response) => {
                debug!(
                    id = query.id,
                    question = %query.describe(),
                    response_len = response.len(),
                    "Upstream answered"
                );
                QueryOutcome::Answered(response)
            }
            Err(e) => {
                warn!(
                    id = query.id,
                    question = %query.describe(),
                    upstream = %self.upstream.upstream(),
                    error = %e,
                    "Upstream query failed, answering SERVFAIL"
                );
                QueryOutcome::ServFail {
                    response: self.codec.servfail(query),
                    reason: e,
                }
            }
        }
    }

    pub async fn execute(&self, payload: Bytes) -> QueryOutcome {
        match self.decode(payload) {
            Ok(query) => self.forward(&query).await,
            Err(outcome) => outcome,
        }
    }
}
