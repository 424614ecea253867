mod dns_codec;
mod upstream_client;

pub use dns_codec::DnsCodec;
pub use upstream_client::UpstreamClient;

// Re-export for convenience
pub use tldns_domain::DnsQuery;
