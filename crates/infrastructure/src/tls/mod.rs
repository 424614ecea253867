pub mod credentials;

pub use credentials::{build_acceptor, load_certs, load_private_key, load_server_config};
