use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::server::ServerConfig;
use super::tls::TlsConfig;
use super::upstream::UpstreamConfig;

/// Main configuration structure for tldns
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (bind address, port, timeouts)
    #[serde(default)]
    pub server: ServerConfig,

    /// Certificate and private key
    #[serde(default)]
    pub tls: TlsConfig,

    /// Upstream resolver
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. tldns.toml in current directory
    /// 3. /etc/tldns/config.toml
    /// 4. Default configuration
    ///
    /// Command-line overrides are applied on top and the result is validated.
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("tldns.toml").exists() {
            Self::from_file("tldns.toml")?
        } else if std::path::Path::new("/etc/tldns/config.toml").exists() {
            Self::from_file("/etc/tldns/config.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides)?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply command-line overrides to configuration
    pub fn apply_cli_overrides(&mut self, overrides: CliOverrides) -> Result<(), ConfigError> {
        if let Some(host) = overrides.host {
            self.server.bind_address = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(cert) = overrides.cert_file {
            self.tls.cert_path = cert;
        }
        if let Some(key) = overrides.key_file {
            self.tls.key_path = key;
        }
        if let Some(upstream) = overrides.upstream_dns {
            self.upstream.set_target(&upstream)?;
        }
        if let Some(timeout) = overrides.query_timeout_ms {
            self.upstream.query_timeout_ms = timeout;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("Listen port cannot be 0".to_string()));
        }

        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Bind address cannot be empty".to_string(),
            ));
        }

        if self.server.handshake_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "TLS handshake timeout must be greater than 0".to_string(),
            ));
        }

        if self.server.idle_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Idle timeout must be greater than 0".to_string(),
            ));
        }

        if self.upstream.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "No upstream server configured".to_string(),
            ));
        }

        if self.upstream.port == 0 {
            return Err(ConfigError::Validation(
                "Upstream port cannot be 0".to_string(),
            ));
        }

        if self.upstream.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Query timeout must be greater than 0".to_string(),
            ));
        }

        if self.tls.cert_path.as_os_str().is_empty() || self.tls.key_path.as_os_str().is_empty()
        {
            return Err(ConfigError::Validation(
                "Certificate and key paths are required".to_string(),
            ));
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub upstream_dns: Option<String>,
    pub query_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}
