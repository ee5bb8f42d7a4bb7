//! Transport layer for rookery.
//!
//! A participant is one persistent, ordered, bidirectional message stream.
//! The [`Transport`] trait accepts such streams and the [`Connection`] trait
//! moves whole frames across one of them. Nothing here knows about rooms or
//! games: a frame is just bytes.
//!
//! A dropped stream is final. There is no resume, so the layers above treat
//! `recv() -> Ok(None)` (or any receive error) as a permanent disconnect.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{
    DEFAULT_HANDSHAKE_TIMEOUT, PendingWebSocket, WebSocketConnection, WebSocketTransport,
};

use std::fmt;
use std::net::SocketAddr;

/// Opaque, process-local identifier for one live connection.
///
/// Identifiers are never reused within a process, so a stale id held by
/// a room can't accidentally address a newer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw counter value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw counter value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A listener that hands out freshly accepted peers.
///
/// `accept` only waits for the socket-level accept. The protocol
/// handshake lives in [`Incoming::upgrade`] so a caller can run it on its
/// own task, and a peer that never finishes it can't hold up the next
/// accept.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Incoming: Incoming<Connection = Self::Connection, Error = Self::Error>;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next peer.
    async fn accept(&mut self) -> Result<Self::Incoming, Self::Error>;

    /// The bound address. After binding port `0` this is the real port.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// An accepted peer whose handshake has not run yet.
pub trait Incoming: Send + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    fn peer_addr(&self) -> SocketAddr;

    /// Completes the handshake, giving up after the transport's
    /// handshake timeout.
    async fn upgrade(self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that carries whole frames in both directions.
///
/// `send` and `recv` may be called concurrently from different tasks:
/// one task typically parks in `recv` while another drains outbound
/// events through `send`.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Writes one whole frame.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Reads the next whole frame, or `Ok(None)` once the peer has closed
    /// the stream.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Starts a clean close. Frames already written are still flushed.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;

    /// The remote address, when the transport knows it.
    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}
