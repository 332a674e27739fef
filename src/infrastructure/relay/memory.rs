//! In-process broker.
//!
//! Fans published payloads out to every subscription whose binding pattern
//! matches the routing key. Several servers sharing one `MemoryBroker`
//! behave like several instances sharing a real broker.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::topology::topic_matches;
use super::{Broker, Deliveries, RelayError};

/// Capacity of the fan-out channel. Subscribers that fall further behind
/// lose the oldest payloads.
const FANOUT_CAPACITY: usize = 4096;

type Envelope = Arc<(String, Vec<u8>)>;

#[derive(Clone)]
pub struct MemoryBroker {
    fanout: Arc<Mutex<broadcast::Sender<Envelope>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FANOUT_CAPACITY);
        Self {
            fanout: Arc::new(Mutex::new(sender)),
        }
    }

    /// End every current subscription stream, as a broker-side connection
    /// loss would. Later subscriptions work normally.
    pub fn sever(&self) {
        let (sender, _) = broadcast::channel(FANOUT_CAPACITY);
        *self.fanout.lock() = sender;
        tracing::debug!("Severed memory broker subscriptions");
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.fanout.lock().receiver_count()
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, routing_key: &str, payload: Vec<u8>) -> Result<(), RelayError> {
        let envelope = Arc::new((routing_key.to_string(), payload));
        // No subscribers is not an error: the message simply has no audience.
        let _ = self.fanout.lock().send(envelope);
        Ok(())
    }

    async fn subscribe(&self, queue: &str, pattern: &str) -> Result<Deliveries, RelayError> {
        let receiver = self.fanout.lock().subscribe();
        let queue = queue.to_string();
        let pattern = pattern.to_string();

        let deliveries = futures::stream::unfold(receiver, move |mut receiver| {
            let queue = queue.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(envelope) => return Some((envelope, receiver)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(queue = %queue, skipped, "Memory queue lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        })
        .filter_map(move |envelope| {
            let payload = topic_matches(&pattern, &envelope.0).then(|| envelope.1.clone());
            futures::future::ready(payload)
        });

        Ok(deliveries.boxed())
    }

    fn address(&self) -> String {
        "memory://".to_string()
    }
}
