//! `RookeryServer` builder and accept loop.
//!
//! This is the entry point for running a rookery server. It ties the
//! layers together: transport → protocol → session → room.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rookery_protocol::{Codec, JsonCodec};
use rookery_room::{Coordinator, RoomConfig, Rules};
use rookery_transport::{DEFAULT_HANDSHAKE_TIMEOUT, Incoming, Transport, WebSocketTransport};

use crate::RookeryError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection task.
pub(crate) struct ServerState<R: Rules, C: Codec> {
    pub(crate) coordinator: Coordinator<R>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a rookery server.
///
/// # Example
///
/// ```rust,no_run
/// use rookery::prelude::*;
///
/// # async fn run() -> Result<(), RookeryError> {
/// let server = RookeryServer::builder()
///     .bind("0.0.0.0:8080")
///     .room_config(RoomConfig {
///         max_display_name_len: 20,
///         ..RoomConfig::default()
///     })
///     .build::<StandardChess>()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RookeryServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    handshake_timeout: Duration,
}

impl RookeryServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets how long a new peer may take to complete the WebSocket upgrade
    /// before it is dropped.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Binds the listener and builds a server speaking JSON.
    pub async fn build<R: Rules>(self) -> Result<RookeryServer<R, JsonCodec>, RookeryError> {
        self.build_with_codec::<R, JsonCodec>(JsonCodec).await
    }

    /// Binds the listener and builds a server with a custom codec.
    pub async fn build_with_codec<R: Rules, C: Codec>(
        self,
        codec: C,
    ) -> Result<RookeryServer<R, C>, RookeryError> {
        let transport = WebSocketTransport::bind(&self.bind_addr)
            .await?
            .with_handshake_timeout(self.handshake_timeout);

        let state = Arc::new(ServerState {
            coordinator: Coordinator::new(self.room_config),
            codec,
        });

        Ok(RookeryServer { transport, state })
    }
}

impl Default for RookeryServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound rookery server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RookeryServer<R: Rules, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<R, C>>,
}

impl RookeryServer<rookery_room::StandardChess, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> RookeryServerBuilder {
        RookeryServerBuilder::new()
    }
}

impl<R: Rules, C: Codec> RookeryServer<R, C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, RookeryError> {
        Ok(self.transport.local_addr()?)
    }

    /// The coordinator every connection talks to.
    pub fn coordinator(&self) -> &Coordinator<R> {
        &self.state.coordinator
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), RookeryError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves.
    ///
    /// Connection tasks already running are left to finish on their own.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), RookeryError>
    where
        F: Future<Output = ()> + Send,
    {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "rookery server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting");
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        let peer = pending.peer_addr();
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            match handle_connection(pending, state).await {
                                Ok(()) => {}
                                Err(e) if e.is_peer_gone() => {
                                    tracing::debug!(%peer, error = %e, "peer dropped");
                                }
                                Err(e) => {
                                    tracing::warn!(%peer, error = %e, "connection task failed");
                                }
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                }
            }
        }
    }
}
