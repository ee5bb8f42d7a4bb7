//! Fan-out of events to the players seated in a room.
//!
//! Delivery is best-effort: an outbox whose writer has gone away is
//! skipped without error, and the disconnect path cleans up the seat. A
//! dead recipient never fails the transition that produced the event.

use rookery_protocol::Event;
use rookery_transport::ConnectionId;

use crate::{Room, Rules};

/// Who should receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// One seated connection.
    One(ConnectionId),
    /// Everyone seated except this connection.
    RoomExcept(ConnectionId),
    /// Everyone seated.
    Room,
}

impl<R: Rules> Room<R> {
    /// Sends `event` to one seated connection.
    pub fn to_one(&self, conn: &ConnectionId, event: Event) {
        if let Some(seat) = self.seats.get(conn) {
            let _ = seat.outbox.send(event);
        }
    }

    /// Sends `event` to every seat but `except`.
    pub fn to_room_except(&self, except: &ConnectionId, event: &Event) {
        for (id, seat) in &self.seats {
            if id != except {
                let _ = seat.outbox.send(event.clone());
            }
        }
    }

    /// Sends `event` to every seat.
    ///
    /// Each player gets an identical copy.
    pub fn to_room(&self, event: &Event) {
        for seat in self.seats.values() {
            let _ = seat.outbox.send(event.clone());
        }
    }

    /// Delivers a transition's events in order.
    pub fn dispatch(&self, events: Vec<(Recipient, Event)>) {
        for (recipient, event) in events {
            match recipient {
                Recipient::One(conn) => self.to_one(&conn, event),
                Recipient::RoomExcept(conn) => self.to_room_except(&conn, &event),
                Recipient::Room => self.to_room(&event),
            }
        }
    }
}
