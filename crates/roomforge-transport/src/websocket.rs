//! WebSocket transport served by an `axum` router.
//!
//! A background task runs the HTTP server. It answers the liveness page on
//! [`LIVENESS_PATH`], performs the WebSocket upgrade on [`UPGRADE_PATH`] and
//! returns 404 for any other path. Join parameters are checked before the
//! upgrade is accepted: a request without them gets HTTP 400 and never
//! reaches [`Transport::accept`].

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::params::JoinQuery;
use crate::{Accepted, Connection, ConnectionId, Frame, JoinParams, Transport, TransportError};

/// Request path that performs the WebSocket upgrade.
pub const UPGRADE_PATH: &str = "/ws";

/// Request path that answers `200 ok` over plain HTTP.
pub const LIVENESS_PATH: &str = "/";

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Upgraded connections waiting for `accept()`.
const ACCEPT_BACKLOG: usize = 128;

type ReadyTx = mpsc::Sender<Accepted<WebSocketConnection>>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    incoming: mpsc::Receiver<Accepted<WebSocketConnection>>,
    server_task: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        let local_addr =
            listener.local_addr().map_err(TransportError::AcceptFailed)?;
        tracing::info!(%local_addr, path = UPGRADE_PATH, "WebSocket transport listening");

        let (tx, rx) = mpsc::channel(ACCEPT_BACKLOG);
        let app = router(tx).into_make_service_with_connect_info::<SocketAddr>();
        let server_task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "HTTP server stopped");
            }
        });

        Ok(Self {
            local_addr,
            incoming: rx,
            server_task,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        Ok(self.local_addr)
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.server_task.abort();
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(
        &mut self,
    ) -> Result<Accepted<Self::Connection>, Self::Error> {
        self.incoming.recv().await.ok_or(TransportError::Shutdown)
    }

    /// Stops the HTTP server and drops the listener. Upgraded connections
    /// run in their own tasks and are unaffected.
    async fn shutdown(&self) -> Result<(), Self::Error> {
        self.server_task.abort();
        tracing::info!(local_addr = %self.local_addr, "WebSocket transport stopped");
        Ok(())
    }
}

fn router(ready: ReadyTx) -> Router {
    Router::new()
        .route(LIVENESS_PATH, get(liveness))
        .route(UPGRADE_PATH, get(upgrade))
        .with_state(ready)
}

async fn liveness() -> &'static str {
    "ok"
}

async fn upgrade(
    State(ready): State<ReadyTx>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<JoinQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let params = match JoinParams::try_from(query) {
        Ok(params) => params,
        Err(e) => {
            tracing::debug!(%addr, error = %e, "upgrade rejected");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    ws.on_upgrade(move |socket| attach(socket, params, addr, ready))
}

async fn attach(socket: WebSocket, params: JoinParams, addr: SocketAddr, ready: ReadyTx) {
    let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(
        %id,
        %addr,
        room_id = %params.room_id,
        player = %params.player_name,
        "accepted WebSocket connection"
    );

    let (sink, stream) = socket.split();
    let accepted = Accepted {
        connection: WebSocketConnection {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        },
        params,
    };
    if ready.send(accepted).await.is_err() {
        tracing::debug!(%id, "transport stopped before accept");
    }
}

/// A single WebSocket connection.
///
/// The socket is split so a writer task can send while the receive loop is
/// parked waiting for the next frame.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WebSocket, Message>>,
    stream: Mutex<SplitStream<WebSocket>>,
}

impl std::fmt::Debug for WebSocketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketConnection")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

fn io_error(kind: std::io::ErrorKind, e: axum::Error) -> std::io::Error {
    std::io::Error::new(kind, e)
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, frame: Frame) -> Result<(), Self::Error> {
        self.sink
            .lock()
            .await
            .send(frame.into_message())
            .await
            .map_err(|e| {
                TransportError::SendFailed(io_error(std::io::ErrorKind::BrokenPipe, e))
            })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.to_vec())),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_str().as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io_error(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(io_error(std::io::ErrorKind::BrokenPipe, e))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
