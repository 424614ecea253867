//! tldns Domain Layer
pub mod config;
pub mod dns_query;
pub mod errors;
pub mod session;
pub mod upstream_exchange;

pub use config::{CliOverrides, Config, ConfigError};
pub use dns_query::{DnsQuery, Question};
pub use errors::DomainError;
pub use session::{Session, SessionState};
pub use upstream_exchange::{UpstreamExchange, UpstreamTransportKind};
