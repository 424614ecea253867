use crate::dns::codec::DNS_HEADER_LEN;
use hickory_proto::op::{Message, ResponseCode};
use tldns_domain::DomainError;

const FLAG_QR: u8 = 0x80;
const FLAG_TC: u8 = 0x02;

/// Header fields of an upstream reply, for validation and logging.
#[derive(Debug, Clone, Copy)]
pub struct ResponseSummary {
    pub id: u16,
    pub rcode: ResponseCode,
    pub truncated: bool,
    pub answer_count: usize,
}

pub struct ResponseParser;

impl ResponseParser {
    /// Checks that an upstream reply is a well-formed DNS response.
    pub fn parse(response_bytes: &[u8]) -> Result<ResponseSummary, DomainError> {
        let message = Message::from_vec(response_bytes).map_err(|e| {
            DomainError::UpstreamIo(format!("Failed to parse upstream response: {}", e))
        })?;

        if response_bytes[2] & FLAG_QR == 0 {
            return Err(DomainError::UpstreamIo(
                "Upstream reply does not have the QR bit set".into(),
            ));
        }

        Ok(ResponseSummary {
            id: u16::from_be_bytes([response_bytes[0], response_bytes[1]]),
            rcode: message.response_code(),
            truncated: message.truncated(),
            answer_count: message.answers().len(),
        })
    }

    /// TC bit read straight from the header. A truncated datagram that does
    /// not fully decode must still trigger the TCP retry.
    pub fn is_truncated(response_bytes: &[u8]) -> bool {
        response_bytes.len() >= DNS_HEADER_LEN && response_bytes[2] & FLAG_TC != 0
    }
}
