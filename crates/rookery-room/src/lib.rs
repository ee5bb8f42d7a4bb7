//! Room lifecycle and coordination for rookery.
//!
//! A room is one two-player game addressed by a four-digit code. This
//! crate owns everything that happens to rooms:
//!
//! - [`RoomStore`]: the shared table of live rooms, with one lock per
//!   room and a connection → room reverse index
//! - [`Room`]: the per-game state machine (seats, phase, position, draw
//!   offer) and the broadcast primitives that fan events out to seats
//! - [`Coordinator`]: turns intents into room mutations and routes
//!   rejections back to the caller
//! - [`Rules`]: the seam to the legality engine; [`StandardChess`] is the
//!   implementation the server runs with
//!
//! # Locking
//!
//! Mutations of the same room serialize on that room's mutex; rooms never
//! wait on each other. While a room lock is held nothing touches the
//! network: events are pushed onto unbounded per-connection queues.

mod broadcast;
mod config;
mod coordinator;
mod error;
mod room;
mod rules;
mod standard;
mod store;

pub use broadcast::Recipient;
pub use config::{RoomConfig, RoomPhase};
pub use coordinator::Coordinator;
pub use error::RoomError;
pub use room::{Room, RoomInfo, Seat, SeatInfo};
pub use rules::{Applied, IllegalMove, Outcome, Rules};
pub use standard::StandardChess;
pub use store::RoomStore;
