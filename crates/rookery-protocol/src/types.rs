//! Value types that travel inside messages.
//!
//! Each type validates itself on the way in. Serde is pointed at a
//! `TryFrom<String>` impl (`#[serde(try_from = "String")]`), so a frame
//! carrying `"code": "48"` or `"from": "z9"` fails to decode instead of
//! reaching the coordinator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// The short, human-shareable address of a room: exactly four decimal
/// digits.
///
/// Kept as a string so leading zeros survive the trip through JSON and
/// through a person reading it aloud to a friend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of digits in every room code.
    pub const LEN: usize = 4;

    /// Parses a room code, rejecting anything but four ASCII digits.
    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(ProtocolError::InvalidRoomCode(s.to_string()))
        }
    }

    /// Formats a number as a zero-padded code. Only the last four digits
    /// are kept.
    pub fn from_number(n: u16) -> Self {
        Self(format!("{:04}", n % 10_000))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// A side of the board. The room creator plays White.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("white"),
            Self::Black => f.write_str("black"),
        }
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A board square in algebraic notation: file `a`..`h`, rank `1`..`8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Parses `"e4"`-style notation. File letters are case-insensitive.
    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        match s.as_bytes() {
            [f, r] => {
                let f = f.to_ascii_lowercase();
                if (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(r) {
                    Ok(Self {
                        file: f - b'a',
                        rank: r - b'1',
                    })
                } else {
                    Err(ProtocolError::InvalidSquare(s.to_string()))
                }
            }
            _ => Err(ProtocolError::InvalidSquare(s.to_string())),
        }
    }

    /// Zero-based file index (`a` = 0).
    pub fn file_index(self) -> usize {
        usize::from(self.file)
    }

    /// Zero-based rank index (rank `1` = 0).
    pub fn rank_index(self) -> usize {
        usize::from(self.rank)
    }
}

impl TryFrom<String> for Square {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Square> for String {
    fn from(sq: Square) -> Self {
        sq.to_string()
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", char::from(b'a' + self.file), char::from(b'1' + self.rank))
    }
}

// ---------------------------------------------------------------------------
// Promotion
// ---------------------------------------------------------------------------

/// The piece a pawn becomes on the last rank.
///
/// Defaults to [`Promotion::Queen`]: a pawn that reaches the last rank
/// without an explicit choice becomes a queen. This is user-visible game
/// behavior, not a parsing fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Promotion {
    #[default]
    #[serde(rename = "q", alias = "Q")]
    Queen,
    #[serde(rename = "r", alias = "R")]
    Rook,
    #[serde(rename = "b", alias = "B")]
    Bishop,
    #[serde(rename = "n", alias = "N")]
    Knight,
}

impl Promotion {
    /// The lowercase letter used on the wire.
    pub fn letter(self) -> char {
        match self {
            Self::Queen => 'q',
            Self::Rook => 'r',
            Self::Bishop => 'b',
            Self::Knight => 'n',
        }
    }
}

// ---------------------------------------------------------------------------
// MoveSpec
// ---------------------------------------------------------------------------

/// A candidate move as a client submits it.
///
/// Whether the move is legal is not this type's business; that is decided
/// by the rules engine against the room's authoritative position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSpec {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<Promotion>,
}

impl MoveSpec {
    /// Builds a move from two squares in algebraic notation.
    pub fn parse(from: &str, to: &str) -> Result<Self, ProtocolError> {
        Ok(Self {
            from: Square::parse(from)?,
            to: Square::parse(to)?,
            promotion: None,
        })
    }

    /// Sets an explicit promotion piece.
    pub fn with_promotion(mut self, piece: Promotion) -> Self {
        self.promotion = Some(piece);
        self
    }

    /// The promotion piece, falling back to the queen default.
    pub fn promotion_or_default(&self) -> Promotion {
        self.promotion.unwrap_or_default()
    }
}

impl fmt::Display for MoveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion {
            write!(f, "{}", p.letter())?;
        }
        Ok(())
    }
}
