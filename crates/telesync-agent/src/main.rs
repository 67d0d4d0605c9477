use anyhow::Result;
use telesync_agent::{Agent, IngestConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting telesync agent"
    );

    // Load configuration
    let config = IngestConfig::from_env()?;

    let agent = Agent::new(config);
    agent.run().await?;

    Ok(())
}
