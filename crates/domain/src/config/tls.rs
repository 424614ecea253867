use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Certificate chain and private key, both PEM encoded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    #[serde(default = "default_cert_path")]
    pub cert_path: PathBuf,

    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: default_cert_path(),
            key_path: default_key_path(),
        }
    }
}

fn default_cert_path() -> PathBuf {
    PathBuf::from("server.crt")
}

fn default_key_path() -> PathBuf {
    PathBuf::from("server.key")
}
