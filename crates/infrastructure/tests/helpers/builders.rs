#![allow(dead_code)]
use std::net::Ipv4Addr;

pub const EXAMPLE_ADDR: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);

/// Standard recursive query with a single question in the IN class.
pub fn build_query(id: u16, domain: &str, qtype: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(&id.to_be_bytes());
    buf.extend_from_slice(&[
        0x01, 0x00, // flags: RD set
        0x00, 0x01, // QDCOUNT = 1
        0x00, 0x00, // ANCOUNT = 0
        0x00, 0x00, // NSCOUNT = 0
        0x00, 0x00, // ARCOUNT = 0
    ]);
    for label in domain.split('.') {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0x00); // root label
    buf.extend_from_slice(&qtype.to_be_bytes());
    buf.extend_from_slice(&[0x00, 0x01]); // QCLASS = IN
    buf
}

pub fn build_a_query(id: u16, domain: &str) -> Vec<u8> {
    build_query(id, domain, 1)
}

/// NOERROR answer with one A record pointing back at the question name.
pub fn answer_a(query: &[u8], addr: Ipv4Addr) -> Vec<u8> {
    let mut response = Vec::with_capacity(query.len() + 16);
    response.extend_from_slice(&query[0..2]);
    response.push(0x81); // QR + RD
    response.push(0x80); // RA, NOERROR
    response.extend_from_slice(&query[4..6]);
    response.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
    response.extend_from_slice(&query[12..]);
    response.extend_from_slice(&[
        0xc0, 0x0c, // pointer to the question name
        0x00, 0x01, // TYPE = A
        0x00, 0x01, // CLASS = IN
        0x00, 0x00, 0x00, 0x3c, // TTL = 60
        0x00, 0x04, // RDLENGTH
    ]);
    response.extend_from_slice(&addr.octets());
    response
}

/// Header-only reply with TC set, as a resolver sends when the answer does
/// not fit the datagram.
pub fn truncated_reply(query: &[u8]) -> Vec<u8> {
    let mut response = Vec::with_capacity(query.len());
    response.extend_from_slice(&query[0..2]);
    response.push(0x83); // QR + TC + RD
    response.push(0x80);
    response.extend_from_slice(&query[4..6]);
    response.extend_from_slice(&[0x00; 6]);
    response.extend_from_slice(&query[12..]);
    response
}

pub fn with_id(message: &[u8], id: u16) -> Vec<u8> {
    let mut copy = message.to_vec();
    copy[0..2].copy_from_slice(&id.to_be_bytes());
    copy
}

pub fn response_id(response: &[u8]) -> u16 {
    u16::from_be_bytes([response[0], response[1]])
}

pub fn rcode(response: &[u8]) -> u8 {
    response[3] & 0x0F
}

pub const RCODE_NOERROR: u8 = 0;
pub const RCODE_SERVFAIL: u8 = 2;
