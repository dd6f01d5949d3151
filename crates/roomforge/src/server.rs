//! `RoomforgeServer` builder and server loop.
//!
//! This is the entry point for running a Roomforge server. It ties together
//! all the layers: transport → protocol → room.

use std::future::{self, Future};
use std::sync::Arc;
use std::time::Duration;

use roomforge_protocol::{Codec, JsonCodec};
use roomforge_room::{Dispatcher, Hub, RoomConfig};
use roomforge_transport::{Transport, TransportError, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{RoomforgeError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) hub: Arc<Hub<C>>,
    pub(crate) codec: C,
    /// Upper bound on a single write before the connection is dropped.
    pub(crate) send_timeout: Duration,
}

/// Builder for configuring and starting a Roomforge server.
///
/// # Example
///
/// ```rust,ignore
/// use roomforge::prelude::*;
///
/// let server = RoomforgeServer::builder()
///     .bind("0.0.0.0:8080")
///     .room_config(RoomConfig { board_size: 24, ..RoomConfig::default() })
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct RoomforgeServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    send_timeout: Duration,
    dispatcher: Option<Dispatcher>,
}

impl RoomforgeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(ServerConfig::default())
    }

    /// Creates a builder from a loaded [`ServerConfig`].
    pub fn from_config(config: ServerConfig) -> Self {
        Self {
            send_timeout: config.send_timeout(),
            bind_addr: config.bind_addr,
            room_config: config.room,
            dispatcher: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the settings every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets how long a single write to a client may take. A client that
    /// stops reading is disconnected once a write exceeds it.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Replaces the standard event handlers.
    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<RoomforgeServer<JsonCodec>, RoomforgeError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let dispatcher = self
            .dispatcher
            .unwrap_or_else(|| Dispatcher::standard(&self.room_config));
        let hub = Hub::with_parts(self.room_config, dispatcher, JsonCodec);

        let state = Arc::new(ServerState {
            hub: Arc::new(hub),
            codec: JsonCodec,
            send_timeout: self.send_timeout,
        });

        Ok(RoomforgeServer { transport, state })
    }
}

impl Default for RoomforgeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Roomforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RoomforgeServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl RoomforgeServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> RoomforgeServerBuilder {
        RoomforgeServerBuilder::new()
    }
}

impl<C> RoomforgeServer<C>
where
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the room registry, which outlives the accept loop.
    pub fn hub(&self) -> Arc<Hub<C>> {
        Arc::clone(&self.state.hub)
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), RoomforgeError> {
        self.run_until(future::pending()).await
    }

    /// Runs the accept loop until `signal` completes, then stops accepting.
    ///
    /// Connections already attached keep running in their own tasks.
    pub async fn run_until(
        mut self,
        signal: impl Future<Output = ()>,
    ) -> Result<(), RoomforgeError> {
        tracing::info!(local_addr = ?self.transport.local_addr().ok(), "Roomforge server running");
        tokio::pin!(signal);

        loop {
            tokio::select! {
                () = &mut signal => {
                    tracing::info!("shutdown requested");
                    break;
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(accepted) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(accepted, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(TransportError::Shutdown) => {
                        return Err(TransportError::Shutdown.into());
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.transport.shutdown().await?;
        Ok(())
    }
}
