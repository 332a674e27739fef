//! Relay Module
//!
//! Cross-instance delivery of channel traffic over a topic-routed broker.
//!
//! Every instance binds its own queue to the wildcard pattern, so every
//! published message reaches every instance, the sender included:
//!
//! ```text
//! Channel::publish ──> Relay::publish ──> broker exchange
//!                                              │ (fan-out)
//!                       ┌──────────────────────┴──────────────┐
//!                       v                                     v
//!            Relay::consume (instance A)          Relay::consume (instance B)
//!                       │                                     │
//!                 Route::route                          Route::route
//!                       │                                     │
//!            Channel::deliver_locally              Channel::deliver_locally
//! ```
//!
//! Delivery is at-least-once and best effort: publish failures are logged
//! and the message is lost.

mod memory;
mod redis_pubsub;
mod topology;

pub use self::memory::MemoryBroker;
pub use self::redis_pubsub::{create_redis_client, RedisBroker};
pub use self::topology::{instance_id, topic_matches, Topology};

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{debug, error, info, instrument, warn};

use crate::config::BrokerSettings;
use crate::domain::Message;
use crate::infrastructure::metrics;

/// Relay error type
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Unsupported broker URL: {0}")]
    UnsupportedUrl(String),

    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    #[error("Could not reopen the consume stream after {0} attempts")]
    ReconnectExhausted(u32),
}

/// Payloads received from a bound queue, in broker order.
pub type Deliveries = BoxStream<'static, Vec<u8>>;

/// A topic-routing publish/subscribe backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publish `payload` to the exchange under `routing_key`.
    async fn publish(&self, routing_key: &str, payload: Vec<u8>) -> Result<(), RelayError>;

    /// Declare `queue`, bind it to `pattern` and start consuming from it.
    /// The stream ends when the broker link breaks.
    async fn subscribe(&self, queue: &str, pattern: &str) -> Result<Deliveries, RelayError>;

    /// Human readable broker location for logs.
    fn address(&self) -> String;
}

/// Receiver of consumed messages, implemented by the server.
pub trait Route: Send + Sync {
    fn route(&self, message: Message);
}

/// Connect to the broker named by `url`.
///
/// `redis://` selects [`RedisBroker`], `memory://` an in-process
/// [`MemoryBroker`]. TLS (`rediss://`) is not built in and is rejected.
pub async fn connect_broker(url: &str) -> Result<Arc<dyn Broker>, RelayError> {
    match url.split_once("://").map(|(scheme, _)| scheme) {
        Some("redis") => Ok(Arc::new(RedisBroker::connect(url).await?)),
        Some("memory") => Ok(Arc::new(MemoryBroker::new())),
        _ => Err(RelayError::UnsupportedUrl(url.to_string())),
    }
}

/// Retry policy for a broken consume stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

impl From<&BrokerSettings> for ReconnectPolicy {
    fn from(settings: &BrokerSettings) -> Self {
        Self {
            attempts: settings.reconnect_attempts,
            delay: Duration::from_millis(settings.reconnect_delay_ms),
        }
    }
}

/// Broker-backed relay of one server instance.
pub struct Relay {
    broker: Arc<dyn Broker>,
    topology: Topology,
    reconnect: ReconnectPolicy,
}

impl Relay {
    pub fn new(broker: Arc<dyn Broker>, topology: Topology, reconnect: ReconnectPolicy) -> Self {
        Self {
            broker,
            topology,
            reconnect,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn address(&self) -> String {
        self.broker.address()
    }

    /// Send `message` to every instance. Failures are logged and swallowed.
    pub async fn publish(&self, message: &Message) {
        let payload = match serde_json::to_vec(message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    channel = %message.channel,
                    sender = %message.sender,
                    error = %e,
                    "Could not marshal message"
                );
                metrics::record_relay("publish_failed");
                return;
            }
        };

        match self.broker.publish(&self.topology.wildcard, payload).await {
            Ok(()) => metrics::record_relay("published"),
            Err(e) => {
                warn!(
                    broker = %self.broker.address(),
                    queue = %self.topology.wildcard,
                    error = %e,
                    "Could not publish message"
                );
                metrics::record_relay("publish_failed");
            }
        }
    }

    /// Bind this instance's queue to the wildcard pattern.
    #[instrument(skip(self), fields(queue = %self.topology.queue))]
    pub async fn subscribe(&self) -> Result<Deliveries, RelayError> {
        let deliveries = self
            .broker
            .subscribe(&self.topology.queue, &self.topology.wildcard)
            .await?;
        info!(
            exchange = %self.topology.exchange,
            queue = %self.topology.queue,
            broker = %self.broker.address(),
            "Bound queue to chat exchange"
        );
        Ok(deliveries)
    }

    /// Consume `deliveries` until the router goes away, routing each message
    /// in broker order. A closed stream is reopened under the reconnect
    /// policy; running out of attempts is returned as an error.
    pub async fn consume(
        &self,
        mut deliveries: Deliveries,
        router: Weak<dyn Route>,
    ) -> Result<(), RelayError> {
        loop {
            while let Some(payload) = deliveries.next().await {
                let Some(router) = router.upgrade() else {
                    debug!(queue = %self.topology.queue, "Router dropped, stopping consumer");
                    return Ok(());
                };
                match Message::from_slice(&payload) {
                    Ok(message) => router.route(message),
                    Err(e) => {
                        warn!(
                            queue = %self.topology.queue,
                            error = %e,
                            "Failed to consume message"
                        );
                        metrics::record_relay("malformed");
                    }
                }
            }

            if router.strong_count() == 0 {
                return Ok(());
            }
            warn!(
                queue = %self.topology.queue,
                broker = %self.broker.address(),
                "Consume stream closed, reopening"
            );
            deliveries = self.reopen().await?;
        }
    }

    async fn reopen(&self) -> Result<Deliveries, RelayError> {
        for attempt in 1..=self.reconnect.attempts {
            tokio::time::sleep(self.reconnect.delay).await;
            match self.subscribe().await {
                Ok(deliveries) => {
                    info!(queue = %self.topology.queue, attempt, "Consume stream reopened");
                    return Ok(deliveries);
                }
                Err(e) => {
                    warn!(
                        queue = %self.topology.queue,
                        attempt,
                        error = %e,
                        "Could not reopen consume stream"
                    );
                }
            }
        }
        error!(
            queue = %self.topology.queue,
            broker = %self.broker.address(),
            "Could not open channel"
        );
        Err(RelayError::ReconnectExhausted(self.reconnect.attempts))
    }
}
