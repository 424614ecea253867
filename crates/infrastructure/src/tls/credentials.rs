//! Server credentials for DNS-over-TLS (RFC 7858 §3.1)
//!
//! Loads a PEM certificate chain and private key and builds the rustls
//! server configuration. Every failure here is fatal at startup.

use rustls::crypto::aws_lc_rs;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tldns_domain::DomainError;
use tokio_rustls::TlsAcceptor;
use tracing::info;

fn open(path: &Path) -> Result<BufReader<File>, DomainError> {
    let file = File::open(path)
        .map_err(|e| DomainError::Credential(format!("{}: {}", path.display(), e)))?;
    Ok(BufReader::new(file))
}

pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, DomainError> {
    let mut reader = open(path)?;

    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            DomainError::Credential(format!(
                "{}: failed to parse certificate: {}",
                path.display(),
                e
            ))
        })?;

    if certs.is_empty() {
        return Err(DomainError::Credential(format!(
            "{}: no certificates found",
            path.display()
        )));
    }

    Ok(certs)
}

/// Accepts PKCS#8, PKCS#1 (RSA) and SEC1 (EC) keys, first one wins.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, DomainError> {
    let mut reader = open(path)?;

    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| {
            DomainError::Credential(format!(
                "{}: failed to parse private key: {}",
                path.display(),
                e
            ))
        })?
        .ok_or_else(|| {
            DomainError::Credential(format!("{}: no valid private key found", path.display()))
        })
}

/// Fails if the key does not match the leaf certificate.
pub fn load_server_config(
    cert_path: &Path,
    key_path: &Path,
) -> Result<Arc<ServerConfig>, DomainError> {
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;
    let chain_len = certs.len();

    let config = ServerConfig::builder_with_provider(Arc::new(aws_lc_rs::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| DomainError::Credential(format!("unsupported TLS configuration: {}", e)))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| {
            DomainError::Credential(format!(
                "{} / {}: {}",
                cert_path.display(),
                key_path.display(),
                e
            ))
        })?;

    info!(
        cert = %cert_path.display(),
        chain_len,
        "TLS credentials loaded"
    );

    Ok(Arc::new(config))
}

pub fn build_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, DomainError> {
    load_server_config(cert_path, key_path).map(TlsAcceptor::from)
}
