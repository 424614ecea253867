use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Lifecycle of one client session.
///
/// ```text
/// AwaitingFrame -> Decoding -> Forwarding -> AwaitingUpstream -> Replying -> AwaitingFrame
///                      \______________________________________/
///                        (undecodable query with a usable id)
/// ```
///
/// `Closed` is reachable from every state and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingFrame,
    Decoding,
    Forwarding,
    AwaitingUpstream,
    Replying,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingFrame => "awaiting_frame",
            Self::Decoding => "decoding",
            Self::Forwarding => "forwarding",
            Self::AwaitingUpstream => "awaiting_upstream",
            Self::Replying => "replying",
            Self::Closed => "closed",
        }
    }

    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (AwaitingFrame, Decoding)
            | (Decoding, Forwarding)
            | (Decoding, Replying)
            | (Forwarding, AwaitingUpstream)
            | (AwaitingUpstream, Replying)
            | (Replying, AwaitingFrame) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct Session {
    peer: SocketAddr,
    state: SessionState,
    queries: u64,
    opened_at: Instant,
}

impl Session {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            state: SessionState::AwaitingFrame,
            queries: 0,
            opened_at: Instant::now(),
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != SessionState::Closed
    }

    /// Moves to `next` if the state machine allows it. Returns `false` and
    /// leaves the state untouched otherwise.
    pub fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        true
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    pub fn record_query(&mut self) -> u64 {
        self.queries += 1;
        self.queries
    }

    pub fn queries(&self) -> u64 {
        self.queries
    }

    pub fn elapsed(&self) -> Duration {
        self.opened_at.elapsed()
    }
}
