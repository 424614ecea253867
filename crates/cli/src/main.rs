use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tldns_domain::CliOverrides;
use tldns_infrastructure::server;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;

#[derive(Parser, Debug)]
#[command(name = "tldns")]
#[command(version)]
#[command(about = "tldns - DNS-over-TLS (RFC 7858) forwarding proxy")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// TLS listening port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// PEM certificate chain
    #[arg(long, value_name = "FILE")]
    cert_file: Option<PathBuf>,

    /// PEM private key
    #[arg(long, value_name = "FILE")]
    key_file: Option<PathBuf>,

    /// Upstream resolver, `host[:port]` (port defaults to 53)
    #[arg(short = 'u', long, value_name = "HOST[:PORT]")]
    upstream_dns: Option<String>,

    /// Per-query upstream timeout in milliseconds
    #[arg(long)]
    query_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            host: self.host.clone(),
            port: self.port,
            cert_file: self.cert_file.clone(),
            key_file: self.key_file.clone(),
            upstream_dns: self.upstream_dns.clone(),
            query_timeout_ms: self.query_timeout_ms,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(cli.config.as_deref(), cli.overrides())?;

    bootstrap::init_logging(&config.logging)?;

    info!("Starting tldns v{}", env!("CARGO_PKG_VERSION"));

    let shutdown = CancellationToken::new();
    tokio::spawn(bootstrap::cancel_on_signal(shutdown.clone()));

    if let Err(e) = server::serve(&config, shutdown).await {
        error!(error = %e, "Server stopped with an error");
        return Err(e).context(format!(
            "tldns could not serve on {}",
            config.server.endpoint()
        ));
    }

    info!("Server shutdown complete");
    Ok(())
}
