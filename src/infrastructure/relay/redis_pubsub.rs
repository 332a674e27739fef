//! Redis pub/sub broker.
//!
//! Redis has no exchanges or queues, so the topology maps onto it this way:
//! the exchange name is the channel namespace, the wildcard routing key is
//! the channel every message is published to, and each instance's "queue"
//! is its own pattern subscription on a dedicated connection.
//!
//! ```text
//!  instance A ──PUBLISH chat.*──┐
//!                               ├──> redis ──PSUBSCRIBE chat.*──> instance A
//!  instance B ──PUBLISH chat.*──┘                             └──> instance B
//! ```

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{info, instrument};

use super::{Broker, Deliveries, RelayError};

/// Creates a Redis connection manager with automatic reconnection.
///
/// The manager is cloned for every publish; clones share one multiplexed
/// connection that reconnects on its own when the link drops.
#[instrument(skip(client))]
pub async fn create_redis_client(client: &Client) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let manager = ConnectionManager::new(client.clone()).await?;
    info!("Redis connection established");
    Ok(manager)
}

pub struct RedisBroker {
    client: Client,
    publisher: ConnectionManager,
    url: String,
}

impl RedisBroker {
    /// Connect to the broker at `url`. Fails if the server cannot be reached.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn connect(url: &str) -> Result<Self, RelayError> {
        let client = Client::open(url)?;
        let publisher = create_redis_client(&client).await?;
        Ok(Self {
            client,
            publisher,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, routing_key: &str, payload: Vec<u8>) -> Result<(), RelayError> {
        let mut conn = self.publisher.clone();
        let _receivers: i64 = conn.publish(routing_key, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, queue: &str, pattern: &str) -> Result<Deliveries, RelayError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.psubscribe(pattern).await?;
        info!(queue = %queue, pattern = %pattern, "Subscribed to Redis pattern");

        let deliveries = pubsub
            .into_on_message()
            .map(|message| message.get_payload_bytes().to_vec());
        Ok(deliveries.boxed())
    }

    fn address(&self) -> String {
        self.url.clone()
    }
}
