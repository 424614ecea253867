use super::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_DNS_PORT: u16 = 53;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// IP address or hostname of the resolver; hostnames are resolved once at startup
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl UpstreamConfig {
    /// Parses `ip`, `ip:port`, `[v6]:port`, bare `v6`, `host` or `host:port`.
    pub fn parse_target(target: &str) -> Result<(String, u16), ConfigError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(ConfigError::InvalidUpstream(
                target.to_string(),
                "empty server".to_string(),
            ));
        }

        if let Ok(addr) = target.parse::<SocketAddr>() {
            return Ok((addr.ip().to_string(), addr.port()));
        }
        if let Ok(ip) = target.parse::<IpAddr>() {
            return Ok((ip.to_string(), DEFAULT_DNS_PORT));
        }
        if target.starts_with('[') {
            return Err(ConfigError::InvalidUpstream(
                target.to_string(),
                "malformed bracketed IPv6 address".to_string(),
            ));
        }

        match target.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|e| {
                    ConfigError::InvalidUpstream(target.to_string(), format!("bad port: {}", e))
                })?;
                if host.is_empty() {
                    return Err(ConfigError::InvalidUpstream(
                        target.to_string(),
                        "missing host".to_string(),
                    ));
                }
                Ok((host.to_string(), port))
            }
            None => Ok((target.to_string(), DEFAULT_DNS_PORT)),
        }
    }

    pub fn set_target(&mut self, target: &str) -> Result<(), ConfigError> {
        let (host, port) = Self::parse_target(target)?;
        self.host = host;
        self.port = port;
        Ok(())
    }

    /// `host:port` form suitable for address resolution.
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

fn default_host() -> String {
    "8.8.8.8".to_string()
}

fn default_port() -> u16 {
    DEFAULT_DNS_PORT
}

fn default_query_timeout_ms() -> u64 {
    5000
}
