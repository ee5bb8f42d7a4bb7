//! Error types for the room layer.

use rookery_protocol::{Color, RejectReason, RoomCode};
use rookery_transport::ConnectionId;

use crate::IllegalMove;

/// Errors that can occur during room operations.
///
/// Every variant is local to the connection that caused it: it is
/// reported back to that connection and leaves shared state untouched.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room already has two players (or is past accepting any).
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The connection is already seated in a room.
    #[error("connection {0} is already in a room")]
    AlreadyInRoom(ConnectionId),

    /// The connection is not seated in any room.
    #[error("connection {0} is not in a room")]
    NotInRoom(ConnectionId),

    /// The caller's room has no game in progress.
    #[error("no game in progress")]
    NotInGame,

    /// It is the other color's move.
    #[error("not your turn: {to_move} to move")]
    NotYourTurn { to_move: Color },

    /// The rules engine refused the move.
    #[error(transparent)]
    IllegalMove(#[from] IllegalMove),

    /// There is no draw offer for this connection to answer.
    #[error("no pending draw offer")]
    NoPendingDraw,

    /// Every room code is in use.
    #[error("no free room codes")]
    CodesExhausted,

    /// The connection is not registered as live.
    #[error("connection {0} is not connected")]
    NotConnected(ConnectionId),
}

impl RoomError {
    /// The reason sent to the client in a `rejected` event.
    pub fn reject_reason(&self) -> RejectReason {
        match self {
            Self::NotFound(_) => RejectReason::RoomNotFound,
            Self::RoomFull(_) => RejectReason::RoomFull,
            Self::AlreadyInRoom(_) => RejectReason::AlreadyInRoom,
            Self::NotInRoom(_) | Self::NotInGame => RejectReason::NotInGame,
            Self::NotYourTurn { .. } => RejectReason::NotYourTurn,
            Self::IllegalMove(_) => RejectReason::IllegalMove,
            Self::NoPendingDraw | Self::CodesExhausted | Self::NotConnected(_) => {
                RejectReason::RejectedGeneric
            }
        }
    }
}
