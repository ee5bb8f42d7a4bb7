//! Wire protocol for rookery.
//!
//! This crate defines the "language" that a browser client and the room
//! coordinator speak:
//!
//! - **Value types** ([`RoomCode`], [`Color`], [`Square`], [`Promotion`],
//!   [`MoveSpec`]): small, validated values that appear inside messages.
//! - **Messages** ([`Intent`], [`Event`]): what a client asks for and
//!   what the coordinator tells it.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (Intent / Event) → Room coordinator
//! ```
//!
//! Validation that only needs the message itself (a room code has four
//! digits, a square is on the board) happens here during decoding, so the
//! coordinator never sees a malformed value.

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{EndReason, Event, GameResult, Intent, RejectReason};
pub use types::{Color, MoveSpec, Promotion, RoomCode, Square};
