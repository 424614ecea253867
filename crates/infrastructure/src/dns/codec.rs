use bytes::Bytes;
use hickory_proto::op::Message;
use tldns_application::ports::DnsCodec;
use tldns_domain::{DnsQuery, DomainError, Question};

pub const DNS_HEADER_LEN: usize = 12;

const FLAG_QR: u8 = 0x80;
const FLAG_RA: u8 = 0x80;
/// OPCODE and RD bits of the third header byte, copied from the query.
const ECHOED_FLAGS_MASK: u8 = 0x79;
const RCODE_SERVFAIL: u8 = 0x02;

/// Codec backed by `hickory-proto` for validation and a raw header walk for
/// the byte-exact question section.
#[derive(Debug, Default, Clone, Copy)]
pub struct HickoryDnsCodec;

impl HickoryDnsCodec {
    pub fn new() -> Self {
        Self
    }
}

impl DnsCodec for HickoryDnsCodec {
    fn decode_query(&self, payload: Bytes) -> Result<DnsQuery, DomainError> {
        if payload.len() < DNS_HEADER_LEN {
            return Err(DomainError::Decode(format!(
                "message is {} bytes, shorter than the DNS header",
                payload.len()
            )));
        }

        let message = Message::from_vec(&payload)
            .map_err(|e| DomainError::Decode(format!("Failed to parse DNS query: {}", e)))?;

        let question_count = u16::from_be_bytes([payload[4], payload[5]]);
        let question_end = question_section_end(&payload, question_count).ok_or_else(|| {
            DomainError::Decode("question section runs past the end of the message".into())
        })?;

        let question = message.queries().first().map(|q| Question {
            name: q.name().to_string().into(),
            record_type: q.query_type().to_string().into(),
            class: q.query_class().to_string().into(),
        });

        let id = u16::from_be_bytes([payload[0], payload[1]]);
        let flags = u16::from_be_bytes([payload[2], payload[3]]);
        let question_wire = payload.slice(DNS_HEADER_LEN..question_end);

        Ok(DnsQuery::new(id, flags, payload).with_question(question, question_count, question_wire))
    }

    fn servfail(&self, query: &DnsQuery) -> Bytes {
        let [flags_hi, _] = query.flags.to_be_bytes();

        let mut buf = Vec::with_capacity(DNS_HEADER_LEN + query.question_wire.len());
        buf.extend_from_slice(&query.id.to_be_bytes());
        buf.push(FLAG_QR | (flags_hi & ECHOED_FLAGS_MASK));
        buf.push(FLAG_RA | RCODE_SERVFAIL);
        buf.extend_from_slice(&query.question_count.to_be_bytes());
        buf.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
        buf.extend_from_slice(&query.question_wire);

        Bytes::from(buf)
    }

    fn servfail_for_id(&self, id: u16) -> Bytes {
        let mut buf = Vec::with_capacity(DNS_HEADER_LEN);
        buf.extend_from_slice(&id.to_be_bytes());
        buf.push(FLAG_QR);
        buf.push(FLAG_RA | RCODE_SERVFAIL);
        buf.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0]);

        Bytes::from(buf)
    }
}

/// Returns the offset just past the last question, following labels and
/// compression pointers without decoding them.
fn question_section_end(buf: &[u8], question_count: u16) -> Option<usize> {
    let mut pos = DNS_HEADER_LEN;

    for _ in 0..question_count {
        loop {
            let label_len = *buf.get(pos)? as usize;
            if label_len == 0 {
                pos += 1;
                break;
            }
            if label_len & 0xC0 == 0xC0 {
                // pointer terminates the name
                pos += 2;
                break;
            }
            pos += 1 + label_len;
        }
        // QTYPE + QCLASS
        pos += 4;
        if pos > buf.len() {
            return None;
        }
    }

    Some(pos)
}
