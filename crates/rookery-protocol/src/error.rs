//! Error types for the protocol layer.
//!
//! Each crate in rookery defines its own error enum. A `ProtocolError`
//! always means "these bytes are not a message we understand", never a
//! game-rule problem; the coordinator answers it with a generic rejection.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, unknown `type` tag,
    /// missing fields, or a field value rejected by validation below.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room code that isn't exactly four decimal digits.
    #[error("invalid room code {0:?}: expected exactly 4 digits")]
    InvalidRoomCode(String),

    /// A square outside `a1`..`h8`.
    #[error("invalid square {0:?}")]
    InvalidSquare(String),
}
