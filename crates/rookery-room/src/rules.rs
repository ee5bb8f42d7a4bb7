//! The `Rules` trait: the seam between coordination and the game itself.
//!
//! The coordinator never looks inside a position. It asks the rules whose
//! turn it is and whether a move is legal; everything else (piece
//! movement, check, castling rights) stays behind this trait.

use std::fmt;

use rookery_protocol::{Color, EndReason, GameResult, MoveSpec};

/// A pure, stateless legality engine.
///
/// All methods are associated functions: a `Rules` type carries no data,
/// and the only state is the `Position` value owned by each room. Calls
/// are synchronous and bounded, so they are safe to make while holding a
/// room's lock.
pub trait Rules: Send + Sync + 'static {
    /// A full board position.
    type Position: Clone + fmt::Debug + Send + Sync + 'static;

    /// The position every game starts from.
    fn initial_position() -> Self::Position;

    /// The color to move in `position`.
    ///
    /// This is the only source of truth for turn order; a client's idea of
    /// whose turn it is never matters.
    fn side_to_move(position: &Self::Position) -> Color;

    /// Validates `mv` in `position` and returns the resulting position.
    ///
    /// A pawn reaching the last rank without an explicit promotion piece
    /// promotes to a queen.
    fn apply(
        position: &Self::Position,
        mv: &MoveSpec,
    ) -> Result<Applied<Self::Position>, IllegalMove>;
}

/// The result of a legal move.
#[derive(Debug, Clone)]
pub struct Applied<P> {
    /// The position after the move.
    pub position: P,
    /// Set when the move ended the game.
    pub outcome: Option<Outcome>,
}

/// A game end the rules engine detects on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
}

impl Outcome {
    pub fn result(self) -> GameResult {
        match self {
            Self::Checkmate { winner } => GameResult::win_for(winner),
            Self::Stalemate => GameResult::Draw,
        }
    }

    pub fn reason(self) -> EndReason {
        match self {
            Self::Checkmate { .. } => EndReason::Checkmate,
            Self::Stalemate => EndReason::Stalemate,
        }
    }
}

/// The rules engine refused a move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal move {mv}: {reason}")]
pub struct IllegalMove {
    pub mv: MoveSpec,
    pub reason: &'static str,
}

impl IllegalMove {
    pub fn new(mv: MoveSpec, reason: &'static str) -> Self {
        Self { mv, reason }
    }
}
