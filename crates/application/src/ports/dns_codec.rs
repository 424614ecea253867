use bytes::Bytes;
use tldns_domain::{DnsQuery, DomainError};

/// RFC 1035 wire-format codec.
pub trait DnsCodec: Send + Sync {
    /// Decodes a client query. Fails with `DomainError::Decode` when the header
    /// or question section cannot be trusted.
    fn decode_query(&self, payload: Bytes) -> Result<DnsQuery, DomainError>;

    /// SERVFAIL echoing the query's id, opcode, RD bit and question section.
    fn servfail(&self, query: &DnsQuery) -> Bytes;

    /// SERVFAIL with only a transaction id and an empty question section.
    fn servfail_for_id(&self, id: u16) -> Bytes;

    /// Best-effort transaction id of a payload that failed to decode.
    fn recover_id(&self, payload: &[u8]) -> Option<u16> {
        match payload {
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }
}
