//! Error types for the session layer.

use rookery_transport::ConnectionId;

/// Errors that can occur while tracking connections.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No entry exists for the given connection.
    #[error("connection {0} is not registered")]
    NotFound(ConnectionId),

    /// The connection id is already registered.
    /// Ids are never reused, so this points at a bug in the caller.
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),
}
