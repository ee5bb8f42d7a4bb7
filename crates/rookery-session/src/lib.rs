//! Connection registry for rookery.
//!
//! This crate answers two questions about a connection id: is it still
//! live, and how do we hand it an event? It knows nothing about rooms.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room layer (above)      ← seats hold an Outbox taken from the registry
//!     ↕
//! Session layer (this)    ← ConnectionId → liveness + outbound queue
//!     ↕
//! Protocol / Transport    ← Event, ConnectionId
//! ```
//!
//! Every connection gets an unbounded outbound queue ([`Outbox`]). Pushing
//! onto it never waits on the network; a per-connection writer task drains
//! it onto the socket. That is what lets the room layer fan events out
//! while it holds a room's lock.

mod error;
mod registry;

pub use error::SessionError;
pub use registry::{ConnectionEntry, ConnectionRegistry, ConnectionState, Outbox, outbox};
