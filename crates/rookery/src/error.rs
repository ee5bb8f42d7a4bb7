//! The error a rookery server task can end with.

use rookery_protocol::ProtocolError;
use rookery_room::RoomError;
use rookery_session::SessionError;
use rookery_transport::TransportError;

/// Whatever stopped a server, a build, or one connection task.
///
/// Rejections a player earns (wrong turn, full room, ...) never show up
/// here; the coordinator answers those with a `rejected` event. What does
/// show up is plumbing: the listener, the socket, the registry.
#[derive(Debug, thiserror::Error)]
pub enum RookeryError {
    /// The listener could not bind, or a peer's socket failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An outbound event could not be serialized.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The connection id was already registered.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),
}

impl RookeryError {
    /// Returns `true` when the peer simply went away or never finished
    /// the upgrade. The server logs those quietly.
    pub fn is_peer_gone(&self) -> bool {
        matches!(
            self,
            Self::Transport(
                TransportError::Handshake(_)
                    | TransportError::HandshakeTimeout(_)
                    | TransportError::SendFailed(_)
                    | TransportError::ReceiveFailed(_)
            )
        )
    }
}
