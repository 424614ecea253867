#![allow(dead_code)]

mod mocks;

pub use mocks::{MockDnsCodec, MockUpstreamClient, UpstreamBehavior};

/// Minimal query: 12-byte header (RD set) plus one question.
pub fn build_query(id: u16, domain: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(12 + domain.len() + 6);
    buf.extend_from_slice(&id.to_be_bytes());
    buf.extend_from_slice(&[0x01, 0x00]); // flags: RD
    buf.extend_from_slice(&[0x00, 0x01]); // QDCOUNT
    buf.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    for label in domain.split('.') {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0x00);
    buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]); // A IN
    buf
}
