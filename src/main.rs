//! # WebChat
//!
//! Entry point: initializes tracing, loads configuration, connects the
//! relay to the broker and serves the websocket chat endpoint.

use std::process::ExitCode;

use tracing::{error, info};

use webchat::config::Settings;
use webchat::startup::Application;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing subscriber for structured logging
    webchat::telemetry::init_tracing();

    info!("Starting WebChat...");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        broker = %settings.broker.url,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await
}
