//! Backend-proxied WebSocket transport.

use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use telesync_core::{IngestEvent, SharedState};
use telesync_proto::parse_frame;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

/// Configuration for the backend-proxied transport.
#[derive(Debug, Clone)]
pub struct WsTransportConfig {
    /// Backend WebSocket endpoint (e.g. <ws://localhost:8080/ws>)
    pub url: String,
    /// Delay between reconnect attempts
    pub retry_delay: Duration,
}

impl Default for WsTransportConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/ws".to_string(),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Backend-proxied WebSocket transport.
///
/// Owns one connection at a time and the loop that re-establishes it.
/// Every inbound frame is classified, applied to the shared state, and
/// forwarded to the events channel; the shared state is mutated by this
/// transport's task only.
pub struct WsTransport {
    shared: Arc<SharedState>,
    task: Option<JoinHandle<()>>,
}

impl WsTransport {
    /// Validate the endpoint and start the connection loop.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL does not parse or is not a
    /// `ws`/`wss` URL. Failures past this point (refused connect, dropped
    /// socket) are retried forever on the configured delay and never
    /// surface to the caller.
    pub fn spawn(
        config: WsTransportConfig,
        shared: Arc<SharedState>,
        events: mpsc::Sender<IngestEvent>,
    ) -> Result<Self, WsTransportError> {
        let url = Url::parse(&config.url)
            .map_err(|e| WsTransportError::InvalidUrl(format!("{}: {e}", config.url)))?;
        match url.scheme() {
            "ws" | "wss" => {}
            scheme => {
                return Err(WsTransportError::InvalidUrl(format!(
                    "{}: unsupported scheme '{scheme}'",
                    config.url
                )));
            }
        }

        let task = tokio::spawn(run_loop(config, Arc::clone(&shared), events));

        Ok(Self {
            shared,
            task: Some(task),
        })
    }

    /// The state cell this transport owns.
    #[must_use]
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Close the connection and suppress all further callbacks.
    ///
    /// Idempotent. Aborting the loop task also cancels any pending retry
    /// sleep. The task is awaited to termination, so once this returns no
    /// further mutation of the shared state occurs.
    pub async fn disconnect(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        self.shared.set_connected(false).await;
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_loop(
    config: WsTransportConfig,
    shared: Arc<SharedState>,
    events: mpsc::Sender<IngestEvent>,
) {
    loop {
        match connect_async(config.url.as_str()).await {
            Ok((stream, _response)) => {
                tracing::info!(url = %config.url, "WebSocket connected");
                shared.set_connected(true).await;

                read_frames(stream, &shared, &events).await;

                shared.set_connected(false).await;
                tracing::warn!(
                    url = %config.url,
                    retry_in = ?config.retry_delay,
                    "WebSocket disconnected"
                );
            }
            Err(e) => {
                shared.set_connected(false).await;
                tracing::warn!(
                    url = %config.url,
                    error = %e,
                    retry_in = ?config.retry_delay,
                    "WebSocket connect failed"
                );
            }
        }

        tokio::time::sleep(config.retry_delay).await;
    }
}

/// Drain one connection until it closes or errors.
async fn read_frames(
    mut stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    shared: &SharedState,
    events: &mpsc::Sender<IngestEvent>,
) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_frame(&text, shared, events).await;
            }
            Ok(Message::Binary(data)) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                handle_frame(&text, shared, events).await;
            }
            Ok(Message::Close(_)) => break,
            // Ping/Pong are answered by the library.
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "WebSocket read error");
                break;
            }
        }
    }
}

async fn handle_frame(text: &str, shared: &SharedState, events: &mpsc::Sender<IngestEvent>) {
    match parse_frame(text) {
        Ok(event) => {
            tracing::debug!(topic = event.topic(), "Received frame");
            shared.apply(&event).await;
            forward(events, event);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Skipping malformed frame");
        }
    }
}

/// Forward a copy to the consumer without ever blocking ingestion.
fn forward(events: &mpsc::Sender<IngestEvent>, event: IngestEvent) {
    if let Err(e) = events.try_send(event) {
        tracing::debug!(error = %e, "Dropping forwarded event");
    }
}

/// Errors that can occur spawning the transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WsTransportError {
    /// Endpoint URL is invalid
    #[error("invalid WebSocket URL: {0}")]
    InvalidUrl(String),
}
