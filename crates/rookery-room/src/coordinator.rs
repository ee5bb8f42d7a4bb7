//! The room coordinator: the one place intents turn into state changes.
//!
//! Each intent arrives tagged with the connection that sent it. The
//! coordinator checks preconditions, mutates the affected room under that
//! room's lock, and fans the resulting events out before the lock is
//! released. A failed precondition never touches shared state. The caller
//! alone is told with a `rejected` event; for the quiet intents (draw
//! offers and answers, resign, timeout, leave) the failure is only logged.

use rookery_protocol::{EndReason, Event, Intent, MoveSpec, RejectReason, RoomCode};
use rookery_session::{ConnectionRegistry, Outbox, SessionError};
use rookery_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::{Room, RoomConfig, RoomError, RoomStore, Rules};

/// Routes intents from connections to rooms.
///
/// Shared by every connection task behind an `Arc`. Intents for different
/// rooms proceed in parallel; intents for the same room serialize on that
/// room's lock.
pub struct Coordinator<R: Rules> {
    store: RoomStore<R>,
    registry: Mutex<ConnectionRegistry>,
}

impl<R: Rules> Coordinator<R> {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            store: RoomStore::new(config),
            registry: Mutex::new(ConnectionRegistry::new()),
        }
    }

    pub fn store(&self) -> &RoomStore<R> {
        &self.store
    }

    pub fn config(&self) -> &RoomConfig {
        self.store.config()
    }

    // -----------------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------------

    /// Registers a new connection and the queue its events go to.
    ///
    /// # Errors
    /// [`SessionError::AlreadyRegistered`] if the id is already known.
    pub async fn connect(&self, conn: ConnectionId, outbox: Outbox) -> Result<(), SessionError> {
        self.registry.lock().await.register(conn, outbox)?;
        tracing::info!(conn_id = %conn, "connection opened");
        Ok(())
    }

    /// Tears down a connection whose stream has ended.
    ///
    /// The connection stops receiving events, leaves its room (which tells
    /// the opponent and, mid-game, ends the game in their favor), and is
    /// forgotten. Safe to call for a connection that never joined a room.
    pub async fn disconnect(&self, conn: ConnectionId) {
        if let Err(e) = self.registry.lock().await.mark_closed(conn) {
            tracing::debug!(conn_id = %conn, error = %e, "disconnect for unknown connection");
        }

        match self.leave(conn).await {
            Ok(code) => tracing::info!(conn_id = %conn, %code, "player left on disconnect"),
            Err(RoomError::NotInRoom(_)) => {}
            Err(e) => tracing::warn!(conn_id = %conn, error = %e, "leave on disconnect failed"),
        }

        self.registry.lock().await.remove(&conn);
        tracing::info!(conn_id = %conn, "connection closed");
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Handles one intent from `conn`.
    ///
    /// Never fails: errors are reported to `conn` (or logged) here.
    pub async fn handle(&self, conn: ConnectionId, intent: Intent) {
        let kind = intent.kind();
        tracing::debug!(conn_id = %conn, kind, "intent received");

        let (result, quiet) = match intent {
            Intent::CreateRoom { display_name } => {
                (self.create_room(conn, &display_name).await.map(drop), false)
            }
            Intent::JoinRoom { code, display_name } => {
                (self.join_room(conn, code, &display_name).await, false)
            }
            Intent::MakeMove(mv) => (self.make_move(conn, mv).await, false),
            Intent::OfferDraw => (self.offer_draw(conn).await, true),
            Intent::RespondDraw { accept } => (self.respond_draw(conn, accept).await, true),
            Intent::Resign => (self.concede(conn, EndReason::Resignation).await, true),
            Intent::ReportTimeout => (self.concede(conn, EndReason::Timeout).await, true),
            Intent::LeaveRoom => (self.leave(conn).await.map(drop), true),
        };

        match result {
            Ok(()) => {}
            Err(e) if quiet => {
                tracing::debug!(conn_id = %conn, kind, error = %e, "intent ignored");
            }
            Err(e) => {
                tracing::debug!(conn_id = %conn, kind, error = %e, "intent rejected");
                self.reject(conn, e.reject_reason()).await;
            }
        }
    }

    /// Sends a `rejected` event to `conn` alone.
    pub async fn reject(&self, conn: ConnectionId, reason: RejectReason) {
        self.registry
            .lock()
            .await
            .send(&conn, Event::Rejected { reason });
    }

    /// Opens a room with `conn` as White.
    pub async fn create_room(
        &self,
        conn: ConnectionId,
        display_name: &str,
    ) -> Result<RoomCode, RoomError> {
        if self.store.room_of(&conn).await.is_some() {
            return Err(RoomError::AlreadyInRoom(conn));
        }
        let outbox = self.outbox_of(conn).await?;
        let name = self.config().display_name(display_name);

        let code = self
            .store
            .create(|code| {
                let (room, events) = Room::open(code, conn, name, outbox);
                room.dispatch(events);
                room
            })
            .await?;
        tracing::info!(conn_id = %conn, %code, "room opened");
        Ok(code)
    }

    /// Seats `conn` as Black in the room with `code`.
    pub async fn join_room(
        &self,
        conn: ConnectionId,
        code: RoomCode,
        display_name: &str,
    ) -> Result<(), RoomError> {
        if self.store.room_of(&conn).await.is_some() {
            return Err(RoomError::AlreadyInRoom(conn));
        }
        let outbox = self.outbox_of(conn).await?;
        let name = self.config().display_name(display_name);

        self.store
            .mutate(&code, |room| {
                let events = room.admit(conn, name, outbox)?;
                room.dispatch(events);
                Ok(())
            })
            .await?;
        tracing::info!(conn_id = %conn, %code, "player joined, game started");
        Ok(())
    }

    pub async fn make_move(&self, conn: ConnectionId, mv: MoveSpec) -> Result<(), RoomError> {
        self.store
            .mutate_for(conn, |room| {
                let events = room.play(conn, mv)?;
                room.dispatch(events);
                Ok(())
            })
            .await
    }

    pub async fn offer_draw(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.store
            .mutate_for(conn, |room| {
                let events = room.offer_draw(conn)?;
                room.dispatch(events);
                Ok(())
            })
            .await
    }

    pub async fn respond_draw(&self, conn: ConnectionId, accept: bool) -> Result<(), RoomError> {
        self.store
            .mutate_for(conn, |room| {
                let events = room.respond_draw(conn, accept)?;
                room.dispatch(events);
                Ok(())
            })
            .await
    }

    /// Ends `conn`'s game as a loss, by resignation or by timeout.
    pub async fn concede(&self, conn: ConnectionId, reason: EndReason) -> Result<(), RoomError> {
        self.store
            .mutate_for(conn, |room| {
                let events = room.concede(conn, reason)?;
                room.dispatch(events);
                Ok(())
            })
            .await
    }

    /// Takes `conn` out of its room, keeping the connection open.
    ///
    /// Returns the code of the room that was left.
    pub async fn leave(&self, conn: ConnectionId) -> Result<RoomCode, RoomError> {
        self.store
            .mutate_for(conn, |room| {
                let (_seat, events) = room.depart(conn)?;
                room.dispatch(events);
                Ok(room.code().clone())
            })
            .await
    }

    async fn outbox_of(&self, conn: ConnectionId) -> Result<Outbox, RoomError> {
        self.registry
            .lock()
            .await
            .outbox(&conn)
            .ok_or(RoomError::NotConnected(conn))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for intent routing. Multi-connection scenarios live in
    //! `tests/coordinator.rs`.

    use rookery_session::outbox;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::StandardChess;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    async fn connected(
        coordinator: &Coordinator<StandardChess>,
        id: u64,
    ) -> UnboundedReceiver<Event> {
        let (tx, rx) = outbox();
        coordinator.connect(cid(id), tx).await.unwrap();
        rx
    }

    #[tokio::test]
    async fn test_connect_twice_returns_error() {
        let coordinator = Coordinator::<StandardChess>::new(RoomConfig::default());
        let _rx = connected(&coordinator, 1).await;
        let result = coordinator.connect(cid(1), outbox().0).await;
        assert!(matches!(result, Err(SessionError::AlreadyRegistered(_))));
    }

    #[tokio::test]
    async fn test_handle_create_room_sends_room_created() {
        let coordinator = Coordinator::<StandardChess>::new(RoomConfig::default());
        let mut rx = connected(&coordinator, 1).await;

        coordinator
            .handle(cid(1), Intent::CreateRoom { display_name: "A".into() })
            .await;

        match rx.try_recv().unwrap() {
            Event::RoomCreated { code, color } => {
                assert_eq!(color, rookery_protocol::Color::White);
                assert_eq!(coordinator.store().room_of(&cid(1)).await, Some(code));
            }
            other => panic!("expected RoomCreated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_create_room_twice_rejects_already_in_room() {
        let coordinator = Coordinator::<StandardChess>::new(RoomConfig::default());
        let mut rx = connected(&coordinator, 1).await;
        let create = Intent::CreateRoom { display_name: "A".into() };

        coordinator.handle(cid(1), create.clone()).await;
        coordinator.handle(cid(1), create).await;

        assert!(matches!(rx.try_recv().unwrap(), Event::RoomCreated { .. }));
        assert_eq!(
            rx.try_recv().unwrap(),
            Event::Rejected {
                reason: RejectReason::AlreadyInRoom
            }
        );
        assert_eq!(coordinator.store().len().await, 1);
    }

    #[tokio::test]
    async fn test_handle_move_outside_room_rejects_not_in_game() {
        let coordinator = Coordinator::<StandardChess>::new(RoomConfig::default());
        let mut rx = connected(&coordinator, 1).await;

        coordinator
            .handle(cid(1), Intent::MakeMove(MoveSpec::parse("e2", "e4").unwrap()))
            .await;

        assert_eq!(
            rx.try_recv().unwrap(),
            Event::Rejected {
                reason: RejectReason::NotInGame
            }
        );
    }

    #[tokio::test]
    async fn test_handle_resign_outside_room_is_silent() {
        let coordinator = Coordinator::<StandardChess>::new(RoomConfig::default());
        let mut rx = connected(&coordinator, 1).await;

        coordinator.handle(cid(1), Intent::Resign).await;
        coordinator.handle(cid(1), Intent::OfferDraw).await;
        coordinator.handle(cid(1), Intent::RespondDraw { accept: true }).await;
        coordinator.handle(cid(1), Intent::LeaveRoom).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_handle_unregistered_connection_cannot_create() {
        let coordinator = Coordinator::<StandardChess>::new(RoomConfig::default());
        let result = coordinator.create_room(cid(1), "A").await;
        assert!(matches!(result, Err(RoomError::NotConnected(_))));
        assert!(coordinator.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_disconnect_waiting_host_deletes_room() {
        let coordinator = Coordinator::<StandardChess>::new(RoomConfig::default());
        let _rx = connected(&coordinator, 1).await;
        let code = coordinator.create_room(cid(1), "A").await.unwrap();

        coordinator.disconnect(cid(1)).await;

        assert!(coordinator.store().get(&code).await.is_none());
        assert!(coordinator.store().room_of(&cid(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_without_room_is_noop() {
        let coordinator = Coordinator::<StandardChess>::new(RoomConfig::default());
        let _rx = connected(&coordinator, 1).await;
        coordinator.disconnect(cid(1)).await;
        coordinator.disconnect(cid(1)).await;
        assert!(coordinator.store().is_empty().await);
    }
}
