//! The connection registry: tracks every live connection and its outbox.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is NOT thread-safe by itself; it's a plain
//! `HashMap`. The coordinator owns one behind a mutex and only holds that
//! mutex for a lookup or an insert, never across a room operation.

use std::collections::HashMap;
use std::time::Instant;

use rookery_protocol::Event;
use rookery_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::SessionError;

/// Outbound event queue for one connection.
///
/// Unbounded on purpose: a send never blocks the sender, so nothing that
/// holds a room lock can stall on a slow socket.
pub type Outbox = mpsc::UnboundedSender<Event>;

/// Creates a fresh outbox and the receiver its writer task drains.
pub fn outbox() -> (Outbox, mpsc::UnboundedReceiver<Event>) {
    mpsc::unbounded_channel()
}

/// Whether a connection can still receive events.
///
/// ```text
///   Live ──(stream closed / writer gone)──→ Closed ──(remove)──→ gone
/// ```
///
/// There is no way back from `Closed`: a dropped stream is a permanent
/// disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// The stream is open; events are delivered.
    Live,
    /// The stream is gone; events are dropped.
    Closed { since: Instant },
}

/// One registered connection.
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub id: ConnectionId,
    pub state: ConnectionState,
    outbox: Outbox,
}

impl ConnectionEntry {
    /// Returns `true` while the connection can receive events.
    pub fn is_live(&self) -> bool {
        matches!(self.state, ConnectionState::Live)
    }
}

/// Maps connection ids to liveness and outbound queues.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly accepted connection as live.
    ///
    /// # Errors
    /// [`SessionError::AlreadyRegistered`] if the id is already present.
    pub fn register(
        &mut self,
        id: ConnectionId,
        outbox: Outbox,
    ) -> Result<(), SessionError> {
        if self.connections.contains_key(&id) {
            return Err(SessionError::AlreadyRegistered(id));
        }
        self.connections.insert(
            id,
            ConnectionEntry {
                id,
                state: ConnectionState::Live,
                outbox,
            },
        );
        tracing::debug!(conn_id = %id, "connection registered");
        Ok(())
    }

    /// Returns `true` if the connection is registered and live.
    pub fn is_live(&self, id: &ConnectionId) -> bool {
        self.connections.get(id).is_some_and(ConnectionEntry::is_live)
    }

    /// Returns a clone of a live connection's outbox.
    ///
    /// Rooms store this in the seat so they can deliver without going
    /// back through the registry.
    pub fn outbox(&self, id: &ConnectionId) -> Option<Outbox> {
        self.connections
            .get(id)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.outbox.clone())
    }

    /// Delivers one event to one connection.
    ///
    /// Best-effort: returns `false` (and does nothing else) if the
    /// connection is unknown or closed. A connection whose writer task has
    /// already gone away is marked closed on the spot.
    pub fn send(&mut self, id: &ConnectionId, event: Event) -> bool {
        let Some(entry) = self.connections.get_mut(id) else {
            return false;
        };
        if !entry.is_live() {
            return false;
        }
        if entry.outbox.send(event).is_err() {
            entry.state = ConnectionState::Closed {
                since: Instant::now(),
            };
            tracing::debug!(conn_id = %id, "outbox closed, marking connection closed");
            return false;
        }
        true
    }

    /// Marks a connection closed. Later sends to it are silent no-ops.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the id was never registered (or was
    /// already removed).
    pub fn mark_closed(&mut self, id: ConnectionId) -> Result<(), SessionError> {
        let entry = self
            .connections
            .get_mut(&id)
            .ok_or(SessionError::NotFound(id))?;
        if entry.is_live() {
            entry.state = ConnectionState::Closed {
                since: Instant::now(),
            };
        }
        Ok(())
    }

    /// Forgets a connection entirely.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<ConnectionEntry> {
        let removed = self.connections.remove(id);
        if removed.is_some() {
            tracing::debug!(conn_id = %id, "connection removed");
        }
        removed
    }

    /// Looks up a connection entry.
    pub fn get(&self, id: &ConnectionId) -> Option<&ConnectionEntry> {
        self.connections.get(id)
    }

    /// Number of live connections.
    pub fn live_count(&self) -> usize {
        self.connections.values().filter(|e| e.is_live()).count()
    }

    /// Number of registered connections in any state.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for `ConnectionRegistry`, following
    //! `test_{function}_{scenario}_{expected}`.

    use super::*;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    // =====================================================================
    // register()
    // =====================================================================

    #[test]
    fn test_register_new_connection_is_live() {
        let mut reg = ConnectionRegistry::new();
        let (tx, _rx) = outbox();

        reg.register(cid(1), tx).expect("should register");

        assert!(reg.is_live(&cid(1)));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.live_count(), 1);
    }

    #[test]
    fn test_register_duplicate_returns_error() {
        let mut reg = ConnectionRegistry::new();
        reg.register(cid(1), outbox().0).unwrap();

        let result = reg.register(cid(1), outbox().0);

        assert!(matches!(result, Err(SessionError::AlreadyRegistered(c)) if c == cid(1)));
    }

    // =====================================================================
    // send()
    // =====================================================================

    #[test]
    fn test_send_live_connection_delivers() {
        let mut reg = ConnectionRegistry::new();
        let (tx, mut rx) = outbox();
        reg.register(cid(1), tx).unwrap();

        assert!(reg.send(&cid(1), Event::DrawOffered));

        assert_eq!(rx.try_recv().unwrap(), Event::DrawOffered);
    }

    #[test]
    fn test_send_unknown_connection_is_noop() {
        let mut reg = ConnectionRegistry::new();
        assert!(!reg.send(&cid(99), Event::DrawOffered));
    }

    #[test]
    fn test_send_closed_connection_is_noop() {
        let mut reg = ConnectionRegistry::new();
        let (tx, mut rx) = outbox();
        reg.register(cid(1), tx).unwrap();
        reg.mark_closed(cid(1)).unwrap();

        assert!(!reg.send(&cid(1), Event::DrawOffered));
        assert!(rx.try_recv().is_err(), "nothing should be queued");
    }

    #[test]
    fn test_send_after_receiver_dropped_marks_closed() {
        let mut reg = ConnectionRegistry::new();
        let (tx, rx) = outbox();
        reg.register(cid(1), tx).unwrap();
        drop(rx);

        assert!(!reg.send(&cid(1), Event::DrawOffered));
        assert!(!reg.is_live(&cid(1)));
        assert!(matches!(
            reg.get(&cid(1)).unwrap().state,
            ConnectionState::Closed { .. }
        ));
    }

    // =====================================================================
    // outbox() / mark_closed() / remove()
    // =====================================================================

    #[test]
    fn test_outbox_only_for_live_connections() {
        let mut reg = ConnectionRegistry::new();
        reg.register(cid(1), outbox().0).unwrap();
        assert!(reg.outbox(&cid(1)).is_some());

        reg.mark_closed(cid(1)).unwrap();
        assert!(reg.outbox(&cid(1)).is_none());
        assert!(reg.outbox(&cid(2)).is_none());
    }

    #[test]
    fn test_mark_closed_unknown_returns_not_found() {
        let mut reg = ConnectionRegistry::new();
        assert!(matches!(
            reg.mark_closed(cid(5)),
            Err(SessionError::NotFound(c)) if c == cid(5)
        ));
    }

    #[test]
    fn test_mark_closed_keeps_entry_until_removed() {
        let mut reg = ConnectionRegistry::new();
        reg.register(cid(1), outbox().0).unwrap();
        reg.mark_closed(cid(1)).unwrap();

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.live_count(), 0);

        let entry = reg.remove(&cid(1)).expect("entry should exist");
        assert_eq!(entry.id, cid(1));
        assert!(reg.is_empty());
        assert!(reg.remove(&cid(1)).is_none());
    }
}
