mod bootstrap;

use anyhow::Result;
use critbot_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use critbot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // .env first, so the token can live next to the binary during development
    dotenv::dotenv().ok();

    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config);

    tracing::info!(
        event_name = "system.server.started",
        "critbot-server started; polling for updates"
    );

    tokio::select! {
        result = app.runner.start() => result?,
        _ = wait_for_shutdown() => {
            tracing::info!(event_name = "system.server.stopping", "critbot-server stopping");
        }
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
