#![allow(dead_code)]
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tldns_infrastructure::dns::framing::{read_frame, write_frame, FrameRead};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimal DNS-over-TLS client.
pub struct DotClient {
    stream: TlsStream<TcpStream>,
}

impl DotClient {
    pub async fn connect(addr: SocketAddr, config: Arc<ClientConfig>) -> Self {
        let tcp = TcpStream::connect(addr).await.unwrap();
        let server_name = ServerName::try_from("localhost").unwrap();
        let stream = TlsConnector::from(config)
            .connect(server_name, tcp)
            .await
            .unwrap();
        Self { stream }
    }

    pub async fn send(&mut self, query: &[u8]) {
        write_frame(&mut self.stream, query).await.unwrap();
    }

    /// Next response, or `None` once the server has closed the session.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        let read = tokio::time::timeout(RECV_TIMEOUT, read_frame(&mut self.stream))
            .await
            .expect("no response from proxy within the receive timeout");

        match read {
            Ok(FrameRead::Frame(bytes)) => Some(bytes.to_vec()),
            Ok(FrameRead::Eof) | Err(_) => None,
        }
    }

    pub async fn query(&mut self, query: &[u8]) -> Vec<u8> {
        self.send(query).await;
        self.recv().await.expect("session closed before a response")
    }

    pub async fn write_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
        self.stream.flush().await.unwrap();
    }

    /// Reads the length prefix and body separately, without the framing helper.
    pub async fn recv_raw(&mut self) -> ([u8; 2], Vec<u8>) {
        let mut prefix = [0u8; 2];
        self.stream.read_exact(&mut prefix).await.unwrap();
        let mut body = vec![0u8; u16::from_be_bytes(prefix) as usize];
        self.stream.read_exact(&mut body).await.unwrap();
        (prefix, body)
    }

    /// Sends close_notify and half-closes the TCP stream. Reads still work.
    pub async fn close_write(&mut self) {
        self.stream.shutdown().await.unwrap();
    }
}
