pub mod dns;
pub mod server;
pub mod tls;
