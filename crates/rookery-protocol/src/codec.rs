//! Codec trait and implementations for turning messages into frames.
//!
//! The session adapter only needs "bytes in, `Intent` out" and "`Event` in,
//! bytes out". Keeping that behind a trait means a compact binary format
//! could replace JSON later without touching the coordinator.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to frame bytes and decodes them back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or a
    /// field fails validation (bad room code, off-board square, ...).
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use rookery_protocol::{Codec, Color, Event, Intent, JsonCodec, RoomCode};
///
/// let codec = JsonCodec;
///
/// let intent: Intent = codec
///     .decode(br#"{"type":"join_room","code":"4821","displayName":"B"}"#)
///     .unwrap();
/// assert!(matches!(intent, Intent::JoinRoom { .. }));
///
/// let bytes = codec
///     .encode(&Event::RoomCreated {
///         code: RoomCode::parse("4821").unwrap(),
///         color: Color::White,
///     })
///     .unwrap();
/// assert_eq!(bytes, br#"{"type":"room_created","code":"4821","color":"white"}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
