//! Rate limiting middleware for actions.
//!
//! The limiter keeps one timestamp per wrapped handler, shared by every
//! session that invokes it: it throttles the command, not the user.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::{Handler, Invocation};
use crate::domain::Message;
use crate::infrastructure::metrics;
use crate::shared::error::ChatError;

pub struct RateLimit {
    inner: Arc<dyn Handler>,
    interval: Duration,
    warning: String,
    last_run: Mutex<Option<Instant>>,
}

impl RateLimit {
    /// Wrap `inner` so it runs at most once per `interval`. Throttled
    /// invokers receive `warning` privately instead.
    pub fn new(inner: Arc<dyn Handler>, interval: Duration, warning: impl Into<String>) -> Self {
        Self {
            inner,
            interval,
            warning: warning.into(),
            last_run: Mutex::new(None),
        }
    }

    /// Claim the slot if the interval has passed since the last run.
    fn try_acquire(&self, now: Instant) -> bool {
        let mut last_run = self.last_run.lock();
        match *last_run {
            Some(previous) if now.saturating_duration_since(previous) < self.interval => false,
            _ => {
                *last_run = Some(now);
                true
            }
        }
    }
}

#[async_trait]
impl Handler for RateLimit {
    async fn invoke(&self, invocation: &Invocation<'_>) -> Result<(), ChatError> {
        if !self.try_acquire(Instant::now()) {
            tracing::debug!(
                user = %invocation.session.name(),
                action = %invocation.tag,
                channel = %invocation.channel.name(),
                "Action throttled"
            );
            metrics::record_action(invocation.tag, "throttled");
            return invocation.session.send(
                Message::notice(invocation.server.name(), &self.warning)
                    .with_channel(invocation.channel.name()),
            );
        }
        self.inner.invoke(invocation).await
    }
}
