//! Agent runtime orchestration.

use crate::bridge::IngestBridge;
use crate::config::IngestConfig;
use anyhow::Result;
use std::time::Duration;

/// Interval between ingestion-state summaries in the log.
const SUMMARY_INTERVAL: Duration = Duration::from_secs(30);

/// The main agent runtime.
pub struct Agent {
    config: IngestConfig,
}

impl Agent {
    /// Create a new agent.
    #[must_use]
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Run the ingestion session until interrupted.
    ///
    /// # Errors
    ///
    /// Returns error if the transport configuration is rejected; runtime
    /// connection failures are retried internally and never end the run.
    pub async fn run(self) -> Result<()> {
        tracing::info!(mode = ?self.config.mode, "Starting ingestion session");

        let (mut bridge, mut events) = IngestBridge::connect(&self.config)?;
        let mut summary = tokio::time::interval(SUMMARY_INTERVAL);

        tracing::info!("Agent running, press Ctrl+C to stop");

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            tracing::debug!(topic = event.topic(), "Message");
                        }
                        None => {
                            tracing::warn!("Events channel closed");
                            break;
                        }
                    }
                }

                _ = summary.tick() => {
                    let snapshot = bridge.snapshot();
                    tracing::info!(
                        connected = snapshot.connected,
                        topics = snapshot.data.len(),
                        logged = snapshot.logs.len(),
                        "Ingestion state"
                    );
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        bridge.shutdown().await;
        tracing::info!("Agent stopped");
        Ok(())
    }
}
