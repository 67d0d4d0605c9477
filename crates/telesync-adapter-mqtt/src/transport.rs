//! Broker-direct MQTT transport.

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use telesync_core::{IngestEvent, Payload, SharedState, TopicFilter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

/// Configuration for the broker-direct transport.
#[derive(Debug, Clone)]
pub struct MqttTransportConfig {
    /// Broker endpoint: `ws://host:9001` (WebSocket listener) or
    /// `tcp://host:1883`
    pub broker_url: String,
    /// Client id prefix; a random suffix is appended per instance
    pub client_id_prefix: String,
    /// Broker username, if the listener requires one
    pub username: Option<String>,
    /// Broker password
    pub password: Option<String>,
    /// Topic patterns subscribed on every (re)connect
    pub topics: Vec<String>,
    /// MQTT keep-alive interval
    pub keep_alive: Duration,
    /// Delay before re-polling after a connection error
    pub retry_delay: Duration,
}

impl Default for MqttTransportConfig {
    fn default() -> Self {
        Self {
            broker_url: "ws://localhost:9001".to_string(),
            client_id_prefix: "telesync".to_string(),
            username: None,
            password: None,
            topics: Vec::new(),
            keep_alive: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Broker-direct MQTT transport.
///
/// Owns the rumqttc event loop task. Connection loss is not fatal: the
/// loop sleeps the configured delay and keeps polling, which re-dials the
/// broker, and the full subscription list is reissued on every `ConnAck`.
pub struct MqttTransport {
    shared: Arc<SharedState>,
    client: AsyncClient,
    task: Option<JoinHandle<()>>,
}

impl MqttTransport {
    /// Validate the configuration and start the event loop.
    ///
    /// # Errors
    ///
    /// Returns error if the broker URL or a topic pattern is invalid.
    /// Connection failures past this point are retried forever and never
    /// surface to the caller.
    pub fn spawn(
        config: MqttTransportConfig,
        shared: Arc<SharedState>,
        events: mpsc::Sender<IngestEvent>,
    ) -> Result<Self, MqttTransportError> {
        let filters = config
            .topics
            .iter()
            .map(|pattern| TopicFilter::parse(pattern))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MqttTransportError::InvalidFilter(e.to_string()))?;

        if filters.is_empty() {
            tracing::warn!("No topic patterns configured; connection will carry no data");
        }

        let options = mqtt_options(&config)?;
        let (client, eventloop) = AsyncClient::new(options, 100);

        let task = tokio::spawn(run_loop(
            eventloop,
            client.clone(),
            filters,
            config.retry_delay,
            Arc::clone(&shared),
            events,
        ));

        Ok(Self {
            shared,
            client,
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
    /// sleep; the task is awaited to termination before the connection
    /// flag drops, so once this returns no further mutation of the shared
    /// state occurs.
    pub async fn disconnect(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.client.try_disconnect();
            task.abort();
            let _ = task.await;
        }
        self.shared.set_connected(false).await;
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    filters: Vec<TopicFilter>,
    retry_delay: Duration,
    shared: Arc<SharedState>,
    events: mpsc::Sender<IngestEvent>,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("Connected to MQTT broker");
                shared.set_connected(true).await;
                resubscribe(&client, &filters);
            }
            Ok(Event::Incoming(Packet::SubAck(_))) => {
                tracing::debug!("Subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let topic = publish.topic.clone();
                tracing::debug!(
                    topic,
                    payload_len = publish.payload.len(),
                    "Received MQTT message"
                );

                let event = IngestEvent::Update {
                    topic,
                    payload: Payload::from_bytes(&publish.payload),
                };
                shared.apply(&event).await;
                forward(&events, event);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                shared.set_connected(false).await;
                tracing::warn!("Broker requested disconnect");
            }
            Ok(_) => {}
            Err(e) => {
                shared.set_connected(false).await;
                tracing::warn!(error = %e, retry_in = ?retry_delay, "MQTT connection error");
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}

/// Reissue every subscription; no subscription state survives a disconnect.
///
/// A failed subscribe leaves the connection usable for the patterns that
/// did subscribe.
fn resubscribe(client: &AsyncClient, filters: &[TopicFilter]) {
    for filter in filters {
        // QoS 0: the ingestion contract is at-most-once.
        match client.try_subscribe(filter.as_str(), QoS::AtMostOnce) {
            Ok(()) => tracing::info!(topic = filter.as_str(), "Subscribed"),
            Err(e) => {
                tracing::warn!(topic = filter.as_str(), error = %e, "Subscribe failed");
            }
        }
    }
}

/// Forward a copy to the consumer without ever blocking ingestion.
fn forward(events: &mpsc::Sender<IngestEvent>, event: IngestEvent) {
    if let Err(e) = events.try_send(event) {
        tracing::debug!(error = %e, "Dropping forwarded event");
    }
}

fn mqtt_options(config: &MqttTransportConfig) -> Result<MqttOptions, MqttTransportError> {
    let client_id = format!(
        "{}-{}",
        config.client_id_prefix,
        Uuid::new_v4().simple()
    );

    let mut options = match parse_broker_url(&config.broker_url)? {
        BrokerEndpoint::Tcp { host, port } => MqttOptions::new(client_id, host, port),
        BrokerEndpoint::Ws { url } => {
            // For websockets rumqttc takes the full URL as the address;
            // the port argument is unused.
            let mut options = MqttOptions::new(client_id, url, 80);
            options.set_transport(rumqttc::Transport::Ws);
            options
        }
    };

    options.set_keep_alive(config.keep_alive);

    if let Some(username) = &config.username {
        let password = config.password.clone().unwrap_or_default();
        options.set_credentials(username, password);
    }

    Ok(options)
}

#[derive(Debug, PartialEq, Eq)]
enum BrokerEndpoint {
    Tcp { host: String, port: u16 },
    Ws { url: String },
}

/// Parse a broker URL into a connection endpoint.
fn parse_broker_url(input: &str) -> Result<BrokerEndpoint, MqttTransportError> {
    if input.contains("://") {
        let url = Url::parse(input)
            .map_err(|e| MqttTransportError::InvalidUrl(format!("{input}: {e}")))?;

        return match url.scheme() {
            "tcp" | "mqtt" => {
                let host = url.host_str().ok_or_else(|| {
                    MqttTransportError::InvalidUrl(format!("{input}: missing host"))
                })?;
                Ok(BrokerEndpoint::Tcp {
                    host: host.to_string(),
                    port: url.port().unwrap_or(1883),
                })
            }
            "ws" => Ok(BrokerEndpoint::Ws {
                url: input.to_string(),
            }),
            scheme => Err(MqttTransportError::InvalidUrl(format!(
                "{input}: unsupported scheme '{scheme}'"
            ))),
        };
    }

    let mut parts = input.split(':');
    let host = parts
        .next()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| MqttTransportError::InvalidUrl(format!("{input}: missing host")))?;
    let port = match parts.next() {
        None => 1883,
        Some(port) => port.parse().map_err(|_| {
            MqttTransportError::InvalidUrl(format!("{input}: invalid port '{port}'"))
        })?,
    };
    if parts.next().is_some() {
        return Err(MqttTransportError::InvalidUrl(format!(
            "{input}: too many ':' separators"
        )));
    }

    Ok(BrokerEndpoint::Tcp {
        host: host.to_string(),
        port,
    })
}

/// Errors that can occur spawning the transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MqttTransportError {
    /// Broker URL is invalid
    #[error("invalid MQTT broker URL: {0}")]
    InvalidUrl(String),
    /// A configured topic pattern is invalid
    #[error("invalid topic filter: {0}")]
    InvalidFilter(String),
}
