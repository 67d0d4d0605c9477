//! Agent configuration.

use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Which transport a session constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Backend-proxied WebSocket feed
    #[default]
    Backend,
    /// Direct MQTT broker connection
    Broker,
}

impl TransportMode {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "backend" | "ws" => Ok(Self::Backend),
            "broker" | "mqtt" => Ok(Self::Broker),
            other => bail!("unknown transport mode '{other}' (expected 'backend' or 'broker')"),
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Transport selection
    pub mode: TransportMode,

    /// Backend feed settings
    pub backend: BackendConfig,

    /// Broker settings
    pub broker: BrokerConfig,

    /// Snapshot poll cadence of the lifecycle bridge
    pub poll_interval: Duration,

    /// Fixed delay between reconnect attempts
    pub retry_delay: Duration,

    /// Capacity of the diagnostic log ring
    pub log_capacity: usize,
}

/// Backend-proxied feed settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend WebSocket endpoint
    pub ws_url: String,
}

/// Broker-direct settings.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Broker endpoint (`ws://host:9001` or `tcp://host:1883`)
    pub broker_url: String,

    /// Client id prefix; each connection appends a random suffix
    pub client_id_prefix: String,

    /// Broker username, if the listener requires one
    pub username: Option<String>,

    /// Broker password
    pub password: Option<String>,

    /// Topic patterns subscribed on every (re)connect
    pub topics: Vec<String>,

    /// MQTT keep-alive interval
    pub keep_alive: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::Backend,
            backend: BackendConfig {
                ws_url: "ws://localhost:8080/ws".to_string(),
            },
            broker: BrokerConfig {
                broker_url: "ws://localhost:9001".to_string(),
                client_id_prefix: "telesync".to_string(),
                username: None,
                password: None,
                topics: BrokerConfig::default_topics(),
                keep_alive: Duration::from_secs(30),
            },
            poll_interval: Duration::from_secs(1),
            retry_delay: Duration::from_secs(5),
            log_capacity: 1000,
        }
    }
}

impl BrokerConfig {
    /// The standard home-energy topic pattern set.
    #[must_use]
    pub fn default_topics() -> Vec<String> {
        [
            "home/tele/grid",
            "home/tele/inverter",
            "home/tele/temps",
            "home/tele/loads",
            "home/plan/prices/day/+",
            "home/intent/hvac/+",
            "home/status/+",
            "home/tele/room/+/temp",
            "home/tele/room/+/motion",
            "home/tele/room/+/contact",
        ]
        .iter()
        .map(ToString::to_string)
        .collect()
    }
}

impl IngestConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TELESYNC_MODE`: "backend" or "broker"
    /// - `TELESYNC_WS_URL`: backend WebSocket endpoint
    /// - `TELESYNC_MQTT_URL`: broker endpoint
    /// - `TELESYNC_MQTT_USERNAME` / `TELESYNC_MQTT_PASSWORD`: broker credentials
    /// - `TELESYNC_CLIENT_ID`: broker client id prefix
    /// - `TELESYNC_TOPICS`: JSON array of topic patterns
    /// - `TELESYNC_RETRY_DELAY_SECS`: reconnect delay in seconds
    /// - `TELESYNC_POLL_INTERVAL_MS`: bridge poll cadence in milliseconds
    /// - `TELESYNC_LOG_CAPACITY`: log ring capacity
    ///
    /// # Errors
    ///
    /// Returns error if a set variable does not parse.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(mode) = std::env::var("TELESYNC_MODE") {
            config.mode = TransportMode::parse(&mode).context("Invalid TELESYNC_MODE")?;
        }

        if let Ok(url) = std::env::var("TELESYNC_WS_URL") {
            config.backend.ws_url = url;
        }

        if let Ok(url) = std::env::var("TELESYNC_MQTT_URL") {
            config.broker.broker_url = url;
        }

        if let Ok(username) = std::env::var("TELESYNC_MQTT_USERNAME") {
            config.broker.username = Some(username);
        }

        if let Ok(password) = std::env::var("TELESYNC_MQTT_PASSWORD") {
            config.broker.password = Some(password);
        }

        if let Ok(prefix) = std::env::var("TELESYNC_CLIENT_ID") {
            config.broker.client_id_prefix = prefix;
        }

        // Parse topic patterns from JSON env var
        if let Ok(topics_json) = std::env::var("TELESYNC_TOPICS") {
            config.broker.topics =
                serde_json::from_str(&topics_json).context("Invalid TELESYNC_TOPICS JSON")?;
        }

        if let Ok(secs) = std::env::var("TELESYNC_RETRY_DELAY_SECS") {
            let secs: u64 = secs.parse().context("Invalid TELESYNC_RETRY_DELAY_SECS")?;
            config.retry_delay = Duration::from_secs(secs);
        }

        if let Ok(millis) = std::env::var("TELESYNC_POLL_INTERVAL_MS") {
            let millis: u64 = millis.parse().context("Invalid TELESYNC_POLL_INTERVAL_MS")?;
            config.poll_interval = Duration::from_millis(millis);
        }

        if let Ok(capacity) = std::env::var("TELESYNC_LOG_CAPACITY") {
            config.log_capacity = capacity.parse().context("Invalid TELESYNC_LOG_CAPACITY")?;
        }

        Ok(config)
    }
}
