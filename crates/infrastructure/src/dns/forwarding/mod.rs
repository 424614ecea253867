pub mod forwarder;
pub mod response_parser;

pub use forwarder::{DnsForwarder, MAX_UDP_QUERY_SIZE};
pub use response_parser::{ResponseParser, ResponseSummary};
