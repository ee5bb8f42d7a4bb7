//! # Rookery
//!
//! Realtime coordination for two-player chess over WebSockets.
//!
//! A player opens a room and gets a four-digit code; a friend joins with
//! that code; from then on the server checks every move against the rules,
//! relays it to both players, and settles draws, resignations, and
//! disconnects. Clocks and rendering stay on the client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rookery::prelude::*;
//!
//! # async fn run() -> Result<(), RookeryError> {
//! let server = RookeryServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build::<StandardChess>()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Layers
//!
//! ```text
//! rookery-transport  WebSocket frames, connection ids
//! rookery-protocol   Intent / Event messages and the JSON codec
//! rookery-session    connection registry and outboxes
//! rookery-room       rooms, the store, the coordinator, the rules seam
//! rookery            this crate: accept loop and per-connection adapter
//! ```

mod error;
mod handler;
mod server;

pub use error::RookeryError;
pub use server::{RookeryServer, RookeryServerBuilder};

/// Everything needed to stand up a server.
pub mod prelude {
    pub use crate::{RookeryError, RookeryServer, RookeryServerBuilder};
    pub use rookery_protocol::{
        Codec, Color, EndReason, Event, GameResult, Intent, JsonCodec, MoveSpec, Promotion,
        RejectReason, RoomCode, Square,
    };
    pub use rookery_room::{Coordinator, RoomConfig, RoomPhase, Rules, StandardChess};
    pub use rookery_transport::ConnectionId;
}
