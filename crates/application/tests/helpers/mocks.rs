use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tldns_application::ports::{DnsCodec, UpstreamClient};
use tldns_domain::{DnsQuery, DomainError};
use tokio::time::Instant;

/// Header-only codec: anything with a full 12-byte header decodes.
pub struct MockDnsCodec;

impl DnsCodec for MockDnsCodec {
    fn decode_query(&self, payload: Bytes) -> Result<DnsQuery, DomainError> {
        if payload.len() < 12 {
            return Err(DomainError::Decode(format!(
                "header needs 12 bytes, got {}",
                payload.len()
            )));
        }
        let id = u16::from_be_bytes([payload[0], payload[1]]);
        let flags = u16::from_be_bytes([payload[2], payload[3]]);
        let qdcount = u16::from_be_bytes([payload[4], payload[5]]);
        let question = payload.slice(12..);
        Ok(DnsQuery::new(id, flags, payload).with_question(None, qdcount, question))
    }

    fn servfail(&self, query: &DnsQuery) -> Bytes {
        let mut buf = Vec::with_capacity(12 + query.question_wire.len());
        buf.extend_from_slice(&query.id.to_be_bytes());
        buf.extend_from_slice(&[0x81, 0x82]);
        buf.extend_from_slice(&query.question_count.to_be_bytes());
        buf.extend_from_slice(&[0x00; 6]);
        buf.extend_from_slice(&query.question_wire);
        Bytes::from(buf)
    }

    fn servfail_for_id(&self, id: u16) -> Bytes {
        let mut buf = vec![0u8; 12];
        buf[..2].copy_from_slice(&id.to_be_bytes());
        buf[2] = 0x81;
        buf[3] = 0x82;
        Bytes::from(buf)
    }
}

pub enum UpstreamBehavior {
    /// Reply with the query bytes and QR set.
    Echo,
    Delay(Duration),
    Fail(DomainError),
    /// Never reply.
    Hang,
}

pub struct MockUpstreamClient {
    behavior: Mutex<UpstreamBehavior>,
    calls: AtomicUsize,
}

impl MockUpstreamClient {
    pub fn new(behavior: UpstreamBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn echo(query: &DnsQuery) -> Bytes {
        let mut response = query.raw.to_vec();
        response[2] |= 0x80;
        Bytes::from(response)
    }
}

#[async_trait]
impl UpstreamClient for MockUpstreamClient {
    async fn forward(&self, query: &DnsQuery, _deadline: Instant) -> Result<Bytes, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = {
            let behavior = self.behavior.lock().unwrap();
            match &*behavior {
                UpstreamBehavior::Echo => return Ok(Self::echo(query)),
                UpstreamBehavior::Fail(e) => return Err(e.clone()),
                UpstreamBehavior::Delay(d) => Some(*d),
                UpstreamBehavior::Hang => None,
            }
        };

        match delay {
            Some(d) => {
                tokio::time::sleep(d).await;
                Ok(Self::echo(query))
            }
            None => std::future::pending().await,
        }
    }

    fn upstream(&self) -> String {
        "192.0.2.53:53".to_string()
    }
}
