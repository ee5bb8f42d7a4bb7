//! Per-connection adapter: frames in, intents to the coordinator, events out.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`], plus a writer task that drains the connection's
//! outbox onto the socket. The flow is:
//!   1. Finish the WebSocket upgrade (bounded by the handshake timeout)
//!   2. Register the connection with the coordinator
//!   3. Loop: receive a frame → decode an intent → hand it over
//!   4. On close or error, disconnect (via the drop guard)
//!
//! Intents from one connection are handled one at a time, in the order
//! they arrived.

use std::sync::Arc;

use rookery_protocol::{Codec, Event, Intent, RejectReason};
use rookery_room::Rules;
use rookery_session::outbox;
use rookery_transport::{Connection, ConnectionId, Incoming, PendingWebSocket, WebSocketConnection};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::RookeryError;
use crate::server::ServerState;

/// Drop guard that disconnects a connection when its handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, the async teardown runs in a fire-and-forget task.
struct DisconnectGuard<R: Rules, C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<R, C>>,
}

impl<R: Rules, C: Codec> Drop for DisconnectGuard<R, C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.coordinator.disconnect(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<R: Rules, C: Codec>(
    pending: PendingWebSocket,
    state: Arc<ServerState<R, C>>,
) -> Result<(), RookeryError> {
    let conn = Arc::new(pending.upgrade().await?);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = ?conn.peer_addr(), "handling new connection");

    let (tx, rx) = outbox();
    state.coordinator.connect(conn_id, tx).await?;
    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    tokio::spawn(write_events(Arc::clone(&conn), Arc::clone(&state), rx));

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        match state.codec.decode::<Intent>(&data) {
            Ok(intent) => state.coordinator.handle(conn_id, intent).await,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode intent");
                state
                    .coordinator
                    .reject(conn_id, RejectReason::RejectedGeneric)
                    .await;
            }
        }
    }

    // _guard drops here → disconnect fires.
    Ok(())
}

/// Writes every event queued for one connection to its socket, in order.
///
/// Ends when the outbox is dropped (the connection was disconnected) or a
/// write fails (the socket is gone).
async fn write_events<R: Rules, C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<R, C>>,
    mut rx: UnboundedReceiver<Event>,
) {
    let conn_id = conn.id();
    while let Some(event) = rx.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            return;
        }
    }
    let _ = conn.close().await;
}
