use std::sync::Arc;

use hub_probe::init::{init_tracing_with_config, LayerConfig};
use hub_probe::{Configuration, EchoClient, Logger, MessageFactory};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let configuration = Configuration::from_dsn("http://127.0.0.1:8080?appName=auth-service")?;
    let logger = Arc::new(Logger::new(
        MessageFactory::with_default_mappers(configuration),
        Arc::new(EchoClient::stdout()),
    ));

    init_tracing_with_config(
        logger,
        LayerConfig {
            enable_stdout: false,
            ..LayerConfig::default()
        },
    )?;

    info!("starting service");
    warn!(latency_ms = 1200_u64, "slow upstream");
    error!(user_id = 42, reason = "invalid password", "authentication failed");

    // Give the background task time to drain the channel.
    sleep(Duration::from_millis(200)).await;
    Ok(())
}
