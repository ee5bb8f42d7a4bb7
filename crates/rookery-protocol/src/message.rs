//! Intents (client → coordinator) and events (coordinator → client).
//!
//! Both enums are internally tagged with a snake_case `"type"` field and
//! use camelCase field names, which is what the browser client reads:
//!
//! ```text
//! {"type":"join_room","code":"4821","displayName":"B"}
//! {"type":"room_joined","code":"4821","color":"black","opponentName":"A"}
//! ```

use serde::{Deserialize, Serialize};

use crate::{Color, MoveSpec, Promotion, RoomCode, Square};

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// A request from a connection to change shared state.
///
/// Each variant carries only the fields that intent needs. There is no
/// "disconnect" intent on the wire: a closed stream *is* the disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Intent {
    /// Open a new room and sit as White.
    CreateRoom {
        #[serde(default)]
        display_name: String,
    },

    /// Sit as Black in a room that has exactly one player.
    JoinRoom {
        code: RoomCode,
        #[serde(default)]
        display_name: String,
    },

    /// Play a move. The coordinator decides whose turn it is.
    MakeMove(MoveSpec),

    /// Offer a draw to the opponent.
    OfferDraw,

    /// Accept or decline the opponent's pending draw offer.
    RespondDraw { accept: bool },

    /// Concede the game.
    Resign,

    /// Leave the current room but keep the connection open.
    LeaveRoom,

    /// The caller's own clock ran out. Clocks live on the client, so the
    /// coordinator takes the report at face value, like a resignation.
    ReportTimeout,
}

impl Intent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::MakeMove(_) => "make_move",
            Self::OfferDraw => "offer_draw",
            Self::RespondDraw { .. } => "respond_draw",
            Self::Resign => "resign",
            Self::LeaveRoom => "leave_room",
            Self::ReportTimeout => "report_timeout",
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A notification from the coordinator to one or more connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Event {
    /// Sent to the creator: the room exists and they play `color`.
    RoomCreated { code: RoomCode, color: Color },

    /// Sent to the joiner: they're seated opposite `opponent_name`.
    RoomJoined {
        code: RoomCode,
        color: Color,
        opponent_name: String,
    },

    /// Sent to the waiting player when someone sits down.
    OpponentJoined { opponent_name: String },

    /// Sent to everyone in the room, mover included, after a legal move.
    MoveApplied {
        from: Square,
        to: Square,
        promotion: Promotion,
        mover_name: String,
        mover_color: Color,
    },

    /// Sent to the opponent of whoever offered.
    DrawOffered,

    /// Sent to whoever offered, once the opponent answers.
    DrawResponse { accepted: bool },

    /// Sent to the opponent of whoever resigned.
    OpponentResigned,

    /// Sent to the player left behind. `name` and `color` describe the
    /// player who left, as they were seated before leaving.
    OpponentDisconnected { name: String, color: Color },

    /// The game is over.
    GameEnded { result: GameResult, reason: EndReason },

    /// The caller's intent was refused. Only ever sent to the caller.
    Rejected { reason: RejectReason },
}

// ---------------------------------------------------------------------------
// Outcomes and rejections
// ---------------------------------------------------------------------------

/// Final score in PGN notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "1-0")]
    WhiteWins,
    #[serde(rename = "0-1")]
    BlackWins,
    #[serde(rename = "1/2-1/2")]
    Draw,
}

impl GameResult {
    /// The result in which `color` wins.
    pub fn win_for(color: Color) -> Self {
        match color {
            Color::White => Self::WhiteWins,
            Color::Black => Self::BlackWins,
        }
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Checkmate,
    Stalemate,
    DrawAgreement,
    Resignation,
    Timeout,
    Disconnection,
}

/// Why an intent was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    RoomNotFound,
    RoomFull,
    AlreadyInRoom,
    NotInGame,
    NotYourTurn,
    IllegalMove,
    RejectedGeneric,
}
