//! Per-connection chat session and its read loop.

use std::pin::pin;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::{Stream, StreamExt};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::actions::Invocation;
use super::{Channel, Server};
use crate::domain::Message;
use crate::infrastructure::metrics;
use crate::shared::error::ChatError;

/// One connected user. Owned by its connection task; channels hold clones
/// while it is seated.
pub struct Session {
    name: String,
    outbound: mpsc::UnboundedSender<Message>,
    active: RwLock<Weak<Channel>>,
    host: Weak<Server>,
}

impl Session {
    pub fn new(
        name: impl Into<String>,
        outbound: mpsc::UnboundedSender<Message>,
        host: Weak<Server>,
    ) -> Self {
        Self {
            name: name.into(),
            outbound,
            active: RwLock::new(Weak::new()),
            host,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a message for the client.
    pub fn send(&self, message: Message) -> Result<(), ChatError> {
        self.outbound
            .send(message)
            .map_err(|_| ChatError::Disconnected(self.name.clone()))
    }

    pub fn active_channel(&self) -> Option<Arc<Channel>> {
        self.active.read().upgrade()
    }

    pub(crate) fn set_active(&self, channel: &Arc<Channel>) {
        *self.active.write() = Arc::downgrade(channel);
    }

    /// Read loop. Runs until `frames` ends, then leaves the active channel.
    ///
    /// If this future is dropped before finishing, the leave is spawned on
    /// the current runtime instead.
    pub async fn watch<S>(self: Arc<Self>, frames: S)
    where
        S: Stream<Item = String>,
    {
        let mut guard = LeaveGuard::arm(&self);
        let mut gate = match self.host.upgrade() {
            Some(server) => InputGate::new(server.text_limit(), server.text_interval()),
            None => {
                guard.disarm();
                self.close().await;
                return;
            }
        };

        let mut frames = pin!(frames);
        while let Some(frame) = frames.next().await {
            let Some(text) = gate.admit(&frame, Instant::now()) else {
                continue;
            };
            debug!(user = %self.name, "Received message from user");
            let Some(server) = self.host.upgrade() else {
                break;
            };
            self.dispatch(&server, text).await;
        }

        guard.disarm();
        self.close().await;
    }

    /// Run the action named by the first word, or post the text to the
    /// active channel.
    async fn dispatch(self: &Arc<Self>, server: &Server, text: &str) {
        let Some(channel) = self.active_channel() else {
            warn!(user = %self.name, "Session has no active channel");
            return;
        };

        let (command, argument) = split_command(text);
        if let Some(action) = server.action(command) {
            let invocation = Invocation {
                server,
                channel: &channel,
                session: self,
                tag: command,
                argument,
            };
            match action.invoke(&invocation).await {
                Ok(()) => metrics::record_action(command, "ok"),
                Err(e) => {
                    warn!(user = %self.name, action = %command, error = %e, "Action failed");
                    metrics::record_action(command, "error");
                }
            }
            return;
        }

        channel.publish(Message::chat(&self.name, text)).await;
    }

    /// Leave the active channel and mark the session closed.
    pub async fn close(self: &Arc<Self>) {
        if let Some(channel) = self.active_channel() {
            channel.leave(self).await;
        }
        metrics::session_closed();
        info!(user = %self.name, "Session closed");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Split a line into command and argument on the first space. A single
/// token is both.
pub fn split_command(text: &str) -> (&str, &str) {
    text.split_once(' ').unwrap_or((text, text))
}

/// Input policy applied to every inbound frame, in order: rate, length,
/// then whitespace trim.
#[derive(Debug)]
pub struct InputGate {
    limit: usize,
    interval: Duration,
    last_frame: Option<Instant>,
}

impl InputGate {
    pub fn new(limit: usize, interval: Duration) -> Self {
        Self {
            limit,
            interval,
            last_frame: None,
        }
    }

    /// Returns the trimmed text if the frame should be dispatched.
    ///
    /// A frame that passes the rate check moves the window even if a later
    /// check drops it.
    pub fn admit<'a>(&mut self, frame: &'a str, now: Instant) -> Option<&'a str> {
        if let Some(last) = self.last_frame {
            if now.saturating_duration_since(last) < self.interval {
                metrics::record_dropped_frame("rate");
                return None;
            }
        }
        self.last_frame = Some(now);

        if frame.chars().count() > self.limit {
            metrics::record_dropped_frame("length");
            return None;
        }

        let text = frame.trim();
        if text.is_empty() {
            metrics::record_dropped_frame("empty");
            return None;
        }
        Some(text)
    }
}

/// Schedules [`Session::close`] if the read loop is dropped early.
struct LeaveGuard(Option<Arc<Session>>);

impl LeaveGuard {
    fn arm(session: &Arc<Session>) -> Self {
        Self(Some(Arc::clone(session)))
    }

    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        let Some(session) = self.0.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { session.close().await });
            }
            Err(_) => warn!(user = %session.name, "No runtime to close session on"),
        }
    }
}
