//! WebSocket Control Endpoint
//!
//! This module defines the rover's control server using the `picoserve`
//! framework. It serves the embedded control page, accepts drive frames over
//! the `/ws` socket, and hands decoded frames to the actuation task through
//! `DRIVE_CHANNEL`. Any way a socket can end, cleanly or not, stops the
//! vehicle before anything else happens.

extern crate alloc;

use alloc::{string::String, vec::Vec};

use embassy_net::Stack;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
use embassy_time::Duration;
use embedded_io_async::Read;
use hashbrown::HashMap;
use lazy_static::lazy_static;
use picoserve::{
    extract::FromRequest,
    io::embedded_io_async as embedded_aio,
    request::{RequestBody, RequestParts},
    response::{
        ws::{Message, ReadMessageError, SocketRx, SocketTx, WebSocketCallback, WebSocketUpgrade},
        StatusCode,
    },
    url_encoded::deserialize_form,
    Router,
};
use serde::Deserialize;

use crate::utils::{
    controllers::{DriveCommand, DRIVE_CHANNEL},
    frontend::{INDEX_HTML, INDEX_JS, UTILS_JS},
    wire::{ControlError, DriveFrame},
};

/// One upgraded drive socket, tagged with its controller session.
pub struct DriveSocket {
    session_id: String,
}

#[derive(Clone, Debug)]
pub struct SessionState {
    pub last_seen: u64,
    pub frames: u64,
}

pub struct SessionManager;

lazy_static! {
    pub static ref SESSION_STORE: Mutex<CriticalSectionRawMutex, HashMap<String, SessionState>> =
        Mutex::new(HashMap::new());
}

/// Zero every actuation channel, motors and headlight alike.
///
/// The halt is queued behind any frames already in flight, so the stop stays
/// ordered with normal traffic.
pub async fn halt() {
    DRIVE_CHANNEL.send(DriveCommand::Halt).await;
}

/// Decode one wire line and queue it for actuation.
///
/// Rejected input (empty or oversized) changes nothing downstream. A frame
/// with degraded tokens is still applied; the degradation is only logged.
pub async fn dispatch_line(line: &str) -> Result<(), ControlError> {
    match DriveFrame::decode(line) {
        Ok((frame, clean)) => {
            if !clean {
                tracing::debug!(line, "frame tokens degraded to zero");
            }
            DRIVE_CHANNEL.send(DriveCommand::Apply(frame)).await;
            Ok(())
        }
        Err(error) => {
            tracing::warn!(?error, len = line.len(), "rejected control frame");
            Err(error)
        }
    }
}

/// Transport anomaly: record the taxonomy entry and stop the vehicle.
async fn fail_safe(
    error: ControlError,
    session_id: &str,
) {
    tracing::warn!(?error, session_id, "stopping vehicle");
    halt().await;
}

impl DriveSocket {
    /// Feed one wire line through decode, the session registry, and on to
    /// the actuation task.
    async fn ingest(&self, line: &str) -> Result<(), ControlError> {
        dispatch_line(line).await?;
        let now = embassy_time::Instant::now().as_secs();
        SessionManager::update_session(&self.session_id, now).await;
        Ok(())
    }
}

/// Handles one upgraded drive connection.
impl WebSocketCallback for DriveSocket {
    async fn run<Reader, Writer>(
        self,
        mut rx: SocketRx<Reader>,
        mut tx: SocketTx<Writer>,
    ) -> Result<(), Writer::Error>
    where
        Reader: embedded_aio::Read,
        Writer: embedded_aio::Write<Error = Reader::Error>,
    {
        let mut buffer = [0; 1024];

        tx.send_text("Connected").await?;

        let close_reason = loop {
            match rx.next_message(&mut buffer).await {
                // The rover never pings, so no pong is ever expected. Stop
                // the vehicle but keep the socket.
                Ok(Message::Pong(_)) => {
                    fail_safe(ControlError::TransportError, &self.session_id).await;
                    continue;
                }
                Ok(Message::Ping(data)) => tx.send_pong(data).await?,
                Ok(Message::Close(reason)) => {
                    tracing::info!(?reason, "websocket closed");
                    fail_safe(ControlError::TransportClosed, &self.session_id).await;
                    break None;
                }
                Ok(Message::Text(data)) => {
                    if self.ingest(data).await.is_err() {
                        tx.send_text("Invalid frame format").await?;
                    }
                }
                Ok(Message::Binary(data)) => match core::str::from_utf8(data) {
                    Ok(text) => {
                        if self.ingest(text).await.is_err() {
                            tx.send_binary(b"Invalid frame format").await?;
                        }
                    }
                    Err(error) => {
                        tracing::error!(?error, "binary frame is not utf-8");
                        tx.send_binary(b"Invalid frame format").await?;
                    }
                },
                Err(error) => {
                    fail_safe(ControlError::TransportError, &self.session_id).await;
                    tracing::error!(?error, "websocket error");
                    let code = match error {
                        ReadMessageError::TextIsNotUtf8 => 1007,
                        ReadMessageError::ReservedOpcode(_) => 1003,
                        ReadMessageError::ReadFrameError(_)
                        | ReadMessageError::UnexpectedMessageStart
                        | ReadMessageError::MessageStartsWithContinuation => 1002,
                        ReadMessageError::Io(err) => return Err(err),
                    };
                    break Some((code, "Websocket Error"));
                }
            };
        };

        SessionManager::remove_session(&self.session_id).await;
        tx.close(close_reason).await
    }
}

impl SessionManager {
    /// Creates a new session with the given session ID and timestamp.
    pub async fn create_session(
        session_id: String,
        timestamp: u64,
    ) {
        SESSION_STORE.lock().await.insert(
            session_id,
            SessionState {
                last_seen: timestamp,
                frames: 0,
            },
        );
    }

    /// Retrieves a copy of the session state for the given session ID.
    /// Returns None if the session does not exist.
    pub async fn get_session(session_id: &str) -> Option<SessionState> {
        SESSION_STORE.lock().await.get(session_id).cloned()
    }

    //noinspection ALL
    /// Marks the session as alive at the given timestamp and counts one
    /// applied frame. Returns true if the session was found and updated.
    pub async fn update_session(
        session_id: &str,
        timestamp: u64,
    ) -> bool {
        if let Some(session) = SESSION_STORE.lock().await.get_mut(session_id) {
            session.last_seen = timestamp;
            session.frames += 1;
            true
        } else {
            false
        }
    }

    /// Removes the session identified by session_id.
    /// Returns true if a session was removed.
    pub async fn remove_session(session_id: &str) -> bool {
        SESSION_STORE.lock().await.remove(session_id).is_some()
    }

    /// Purges sessions that have not been updated since the provided threshold.
    /// For example, pass in a timestamp and any session with last_seen less
    /// than that value will be removed.
    pub async fn purge_stale_sessions(threshold: u64) {
        // Retain sessions that have a last_seen timestamp >= threshold.
        SESSION_STORE
            .lock()
            .await
            .retain(|_id, session| session.last_seen >= threshold);
    }

    /// Returns a list of active session IDs.
    pub async fn list_sessions() -> Vec<String> {
        SESSION_STORE.lock().await.keys().cloned().collect()
    }
}

//noinspection ALL
//noinspection ALL
/// Creates the control server
pub async fn run(
    id: usize,
    port: u16,
    stack: Stack<'static>,
    config: Option<&'static picoserve::Config<Duration>>,
) -> ! {
    let default_config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        persistent_start_read_request: None,
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(5)),
    });

    let config = config.unwrap_or(&default_config);

    let router = Router::new()
        // Serve the control page at "/"
        .route(
            "/",
            picoserve::routing::get(|| async {
                picoserve::response::Response::new(StatusCode::OK, INDEX_HTML)
                    .with_headers([("Content-Type", "text/html; charset=utf-8")])
            }),
        )
        // Serve the drive client at "/index.js"
        .route(
            "/index.js",
            picoserve::routing::get(|| async {
                picoserve::response::Response::new(StatusCode::OK, INDEX_JS)
                    .with_headers([("Content-Type", "application/javascript; charset=utf-8")])
            }),
        )
        // Serve the joystick widget at "/utils.js"
        .route(
            "/utils.js",
            picoserve::routing::get(|| async {
                picoserve::response::Response::new(StatusCode::OK, UTILS_JS)
                    .with_headers([("Content-Type", "application/javascript; charset=utf-8")])
            }),
        )
        // Out-of-band stop, used by the page when a drag ends
        .route(
            "/stop",
            picoserve::routing::get(|| async {
                tracing::info!("stop requested over http");
                halt().await;
                picoserve::response::Response::new(StatusCode::OK, "<p>success!</p>")
                    .with_headers([("Content-Type", "text/html; charset=utf-8")])
            }),
        )
        // Drive frames on "/ws"
        .route(
            "/ws",
            picoserve::routing::get(|params: WsConnectionParams| async move {
                let session_id = params.query.session;
                tracing::info!("New drive connection with session id: {}", session_id);
                let now = embassy_time::Instant::now().as_secs();
                SessionManager::create_session(session_id.clone(), now).await;
                params
                    .upgrade
                    .on_upgrade(DriveSocket { session_id })
                    .with_protocol("drive")
            }),
        );

    // Print out the IP and port before starting the server.
    if let Some(ip_cfg) = stack.config_v4() {
        tracing::info!("Starting server at {}:{}", ip_cfg.address, port);
    } else {
        tracing::warn!(
            "Starting control server on port {port}, but no IPv4 address is assigned yet!"
        );
    }

    let (mut rx_buffer, mut tx_buffer, mut http_buffer) = ([0; 1024], [0; 1024], [0; 4096]);

    picoserve::listen_and_serve(
        id,
        &router,
        config,
        stack,
        port,
        &mut rx_buffer,
        &mut tx_buffer,
        &mut http_buffer,
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    session: String,
}

pub struct WsConnectionParams {
    pub upgrade: WebSocketUpgrade,
    pub query: QueryParams,
}

impl<'r, S> FromRequest<'r, S> for WsConnectionParams {
    type Rejection = &'static str;

    async fn from_request<R: Read>(
        state: &'r S,
        parts: RequestParts<'r>,
        body: RequestBody<'r, R>,
    ) -> Result<Self, Self::Rejection> {
        // First extract the WebSocketUpgrade as usual.
        let upgrade = WebSocketUpgrade::from_request(state, parts.clone(), body)
            .await
            .map_err(|_| "Failed to extract WebSocketUpgrade")?;

        // Then extract the query string for QueryParams.
        let query_str = parts.query().ok_or("Missing query parameters")?;
        let query =
            deserialize_form::<QueryParams>(query_str).map_err(|_| "Invalid query parameters")?;

        if query.session.is_empty() {
            return Err("Session ID is required");
        }

        Ok(WsConnectionParams { upgrade, query })
    }
}
