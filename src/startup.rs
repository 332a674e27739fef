//! Application Startup
//!
//! Application building and server initialization.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::application::{build_server, Server};
use crate::config::Settings;
use crate::infrastructure::relay::{connect_broker, Broker, ReconnectPolicy, RelayError, Topology};
use crate::presentation::http::{handlers::health, routes};
use crate::presentation::middleware::{create_cors_layer, create_trace_layer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub server: Arc<Server>,
    pub settings: Arc<Settings>,
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    server: Arc<Server>,
    consumer: JoinHandle<Result<(), RelayError>>,
}

impl Application {
    /// Build the application from settings, connecting to the configured broker.
    pub async fn build(settings: Settings) -> Result<Self> {
        let broker = connect_broker(&settings.broker.url)
            .await
            .with_context(|| format!("Could not connect to broker at {}", settings.broker.url))?;
        Self::build_with_broker(settings, broker).await
    }

    /// Build the application on an existing broker.
    pub async fn build_with_broker(settings: Settings, broker: Arc<dyn Broker>) -> Result<Self> {
        health::init_server_start();

        // Chat server with configured channels and actions
        let server = build_server(&settings.chat);
        tracing::info!(
            server = %server.name(),
            channels = server.list_channels().len(),
            actions = server.list_actions().len(),
            "Chat server created"
        );

        // Attach the relay before any connection can be accepted
        let topology = Topology::for_instance(&settings.broker.exchange);
        let consumer = server
            .connect(broker, topology, ReconnectPolicy::from(&settings.broker))
            .await
            .context("Could not bind relay queue")?;

        let state = AppState {
            server: Arc::clone(&server),
            settings: Arc::new(settings.clone()),
        };

        // Build router with middleware
        let router = routes::create_router(state)
            .layer(create_trace_layer())
            .layer(create_cors_layer(&settings.cors));

        // Bind to address
        let listener = TcpListener::bind(settings.server_addr()).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            server,
            consumer,
        })
    }

    /// Serve until the listener fails or the relay consumer gives up.
    pub async fn run_until_stopped(self) -> Result<()> {
        let serve = axum::serve(self.listener, self.router).into_future();

        tokio::select! {
            result = serve => {
                result.context("HTTP server failed")?;
                Ok(())
            }
            result = self.consumer => match result {
                Ok(Ok(())) => anyhow::bail!("Relay consumer stopped"),
                Ok(Err(e)) => Err(e).context("Relay consumer failed"),
                Err(e) => Err(e).context("Relay consumer panicked"),
            },
        }
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn server(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }
}
