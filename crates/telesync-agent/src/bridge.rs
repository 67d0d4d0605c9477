//! Lifecycle bridge between a transport and its consumer.

use crate::config::{IngestConfig, TransportMode};
use std::sync::Arc;
use std::time::Duration;
use telesync_adapter_mqtt::{MqttTransport, MqttTransportConfig, MqttTransportError};
use telesync_adapter_ws::{WsTransport, WsTransportConfig, WsTransportError};
use telesync_core::{IngestEvent, SharedState, Snapshot};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Capacity of the forwarded-events channel handed to the consumer.
const EVENTS_CAPACITY: usize = 256;

/// The two transports behind one contract.
enum Transport {
    Backend(WsTransport),
    Broker(MqttTransport),
}

impl Transport {
    async fn disconnect(&mut self) {
        match self {
            Self::Backend(transport) => transport.disconnect().await,
            Self::Broker(transport) => transport.disconnect().await,
        }
    }
}

/// Owns one transport per session and surfaces its state on a fixed cadence.
///
/// Transports mutate their own state rather than pushing per-field change
/// notifications, so the bridge samples a [`Snapshot`] copy on the poll
/// interval into a watch channel. The consumer's view is eventually
/// consistent, bounded by one poll tick.
pub struct IngestBridge {
    transport: Option<Transport>,
    poll_task: Option<JoinHandle<()>>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl IngestBridge {
    /// Start a session: construct the configured transport and begin
    /// polling snapshots.
    ///
    /// Returns the bridge and the consumer's message channel, which
    /// receives a copy of every normalized inbound message.
    ///
    /// # Errors
    ///
    /// Returns error if the transport configuration is invalid. Transport
    /// failures past construction are retried internally and only ever
    /// show up as `connected == false` in the snapshot.
    pub fn connect(
        config: &IngestConfig,
    ) -> Result<(Self, mpsc::Receiver<IngestEvent>), BridgeError> {
        let shared = Arc::new(SharedState::new(config.log_capacity));
        let (events_tx, events_rx) = mpsc::channel(EVENTS_CAPACITY);

        let transport = match config.mode {
            TransportMode::Backend => Transport::Backend(WsTransport::spawn(
                ws_config(config),
                Arc::clone(&shared),
                events_tx,
            )?),
            TransportMode::Broker => Transport::Broker(MqttTransport::spawn(
                broker_config(config),
                Arc::clone(&shared),
                events_tx,
            )?),
        };

        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let poll_task = tokio::spawn(poll_loop(shared, snapshot_tx, config.poll_interval));

        Ok((
            Self {
                transport: Some(transport),
                poll_task: Some(poll_task),
                snapshot_rx,
            },
            events_rx,
        ))
    }

    /// Subscribe to the polled snapshot stream.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// The most recently polled snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Whether the last poll saw a live connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.snapshot_rx.borrow().connected
    }

    /// End the session.
    ///
    /// Teardown order is load-bearing: the transport is disconnected and
    /// awaited to termination first, then the poll task stops. After this
    /// returns it is safe to construct a replacement; no callback from the
    /// old transport can observe or mutate anything.
    pub async fn shutdown(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.disconnect().await;
        }
        if let Some(task) = self.poll_task.take() {
            task.abort();
            let _ = task.await;
        }
    }

    /// Replace the running session with a freshly configured one.
    ///
    /// The old transport is fully torn down before the new one is
    /// constructed; the two never coexist.
    ///
    /// # Errors
    ///
    /// Returns error if the new configuration is invalid. The old session
    /// is gone either way.
    pub async fn restart(
        &mut self,
        config: &IngestConfig,
    ) -> Result<mpsc::Receiver<IngestEvent>, BridgeError> {
        self.shutdown().await;
        let (replacement, events_rx) = Self::connect(config)?;
        *self = replacement;
        Ok(events_rx)
    }
}

impl Drop for IngestBridge {
    fn drop(&mut self) {
        // Transports abort their own task on drop.
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }
}

async fn poll_loop(
    shared: Arc<SharedState>,
    snapshot_tx: watch::Sender<Snapshot>,
    poll_interval: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        ticker.tick().await;
        let snapshot = shared.snapshot().await;
        if snapshot_tx.send(snapshot).is_err() {
            break;
        }
    }
}

fn ws_config(config: &IngestConfig) -> WsTransportConfig {
    WsTransportConfig {
        url: config.backend.ws_url.clone(),
        retry_delay: config.retry_delay,
    }
}

fn broker_config(config: &IngestConfig) -> MqttTransportConfig {
    MqttTransportConfig {
        broker_url: config.broker.broker_url.clone(),
        client_id_prefix: config.broker.client_id_prefix.clone(),
        username: config.broker.username.clone(),
        password: config.broker.password.clone(),
        topics: config.broker.topics.clone(),
        keep_alive: config.broker.keep_alive,
        retry_delay: config.retry_delay,
    }
}

/// Errors constructing a session.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// Backend transport rejected its configuration
    #[error(transparent)]
    Backend(#[from] WsTransportError),
    /// Broker transport rejected its configuration
    #[error(transparent)]
    Broker(#[from] MqttTransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> IngestConfig {
        IngestConfig {
            // An endpoint nothing listens on: connect attempts fail and
            // retry forever without surfacing an error.
            backend: crate::config::BackendConfig {
                ws_url: "ws://127.0.0.1:9".to_string(),
            },
            poll_interval: Duration::from_millis(20),
            retry_delay: Duration::from_millis(50),
            ..IngestConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn connect_failure_is_not_fatal() {
        let (mut bridge, _events) = IngestBridge::connect(&test_config()).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        let snapshot = bridge.snapshot();
        assert!(!snapshot.connected);
        assert!(snapshot.data.is_empty());

        bridge.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_is_idempotent() {
        let (mut bridge, _events) = IngestBridge::connect(&test_config()).unwrap();
        bridge.shutdown().await;
        bridge.shutdown().await;
        assert!(!bridge.is_connected());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn invalid_config_is_rejected_up_front() {
        let mut config = test_config();
        config.backend.ws_url = "ftp://example.com".to_string();

        assert!(matches!(
            IngestBridge::connect(&config),
            Err(BridgeError::Backend(_))
        ));
    }
}
