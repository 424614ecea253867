#![allow(dead_code)]
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tldns_infrastructure::dns::framing::{read_frame, write_frame, FrameRead};
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::{CancellationToken, DropGuard};

use super::builders::{answer_a, EXAMPLE_ADDR};

pub enum MockReply {
    Respond(Vec<u8>),
    RespondAfter(Vec<u8>, Duration),
    Ignore,
}

type Responder = Arc<dyn Fn(&[u8]) -> MockReply + Send + Sync>;

/// Plain DNS upstream on loopback. UDP always; TCP on the same port when a
/// TCP responder is given.
pub struct MockDnsServer {
    addr: SocketAddr,
    udp_queries: Arc<AtomicUsize>,
    tcp_queries: Arc<AtomicUsize>,
    _shutdown: DropGuard,
}

impl MockDnsServer {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&[u8]) -> MockReply + Send + Sync + 'static,
    {
        Self::spawn(Arc::new(responder), None).await
    }

    pub async fn start_with_tcp<U, T>(udp: U, tcp: T) -> Self
    where
        U: Fn(&[u8]) -> MockReply + Send + Sync + 'static,
        T: Fn(&[u8]) -> MockReply + Send + Sync + 'static,
    {
        Self::spawn(Arc::new(udp), Some(Arc::new(tcp))).await
    }

    /// Answers every query with an A record for [`EXAMPLE_ADDR`].
    pub async fn answering() -> Self {
        Self::start(|query| MockReply::Respond(answer_a(query, EXAMPLE_ADDR))).await
    }

    pub async fn silent() -> Self {
        Self::start(|_| MockReply::Ignore).await
    }

    async fn spawn(udp: Responder, tcp: Option<Responder>) -> Self {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let addr = socket.local_addr().unwrap();
        let token = CancellationToken::new();
        let udp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_queries = Arc::new(AtomicUsize::new(0));

        tokio::spawn(run_udp(
            socket,
            udp,
            Arc::clone(&udp_queries),
            token.clone(),
        ));

        if let Some(tcp) = tcp {
            let listener = TcpListener::bind(addr).await.unwrap();
            tokio::spawn(run_tcp(
                listener,
                tcp,
                Arc::clone(&tcp_queries),
                token.clone(),
            ));
        }

        Self {
            addr,
            udp_queries,
            tcp_queries,
            _shutdown: token.drop_guard(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.tcp_queries.load(Ordering::SeqCst)
    }
}

async fn run_udp(
    socket: Arc<UdpSocket>,
    responder: Responder,
    counter: Arc<AtomicUsize>,
    token: CancellationToken,
) {
    let mut buf = vec![0u8; 65535];

    loop {
        let (len, peer) = tokio::select! {
            _ = token.cancelled() => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok(received) => received,
                Err(_) => continue,
            },
        };

        counter.fetch_add(1, Ordering::SeqCst);
        match responder(&buf[..len]) {
            MockReply::Respond(bytes) => {
                let _ = socket.send_to(&bytes, peer).await;
            }
            MockReply::RespondAfter(bytes, delay) => {
                let socket = Arc::clone(&socket);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = socket.send_to(&bytes, peer).await;
                });
            }
            MockReply::Ignore => {}
        }
    }
}

async fn run_tcp(
    listener: TcpListener,
    responder: Responder,
    counter: Arc<AtomicUsize>,
    token: CancellationToken,
) {
    loop {
        let (mut stream, _) = tokio::select! {
            _ = token.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(_) => continue,
            },
        };

        let responder = Arc::clone(&responder);
        let counter = Arc::clone(&counter);
        tokio::spawn(async move {
            while let Ok(FrameRead::Frame(query)) = read_frame(&mut stream).await {
                counter.fetch_add(1, Ordering::SeqCst);
                let reply = match responder(&query[..]) {
                    MockReply::Respond(bytes) => bytes,
                    MockReply::RespondAfter(bytes, delay) => {
                        tokio::time::sleep(delay).await;
                        bytes
                    }
                    // hold the connection open without answering
                    MockReply::Ignore => {
                        std::future::pending::<()>().await;
                        return;
                    }
                };
                if write_frame(&mut stream, &reply).await.is_err() {
                    return;
                }
            }
        });
    }
}
