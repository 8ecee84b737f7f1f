//! Flight Delay API - Main Entry Point

use api::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::load()?;
    init_logging(&config.log_level)?;

    info!("=== Flight Delay API v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Model artifact: {}", config.model_path);

    run_server(config).await?;

    Ok(())
}
