//! Error types for the transport layer.

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The TCP connection was accepted but the WebSocket upgrade failed.
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    /// The peer did not finish the WebSocket upgrade in time.
    #[error("websocket handshake timed out after {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// Sending a frame failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receiving a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// The local address could not be read from the listener.
    #[error("local address unavailable: {0}")]
    LocalAddr(#[source] std::io::Error),
}
