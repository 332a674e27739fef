//! Chat server: channel table, action registry and relay handle.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::actions::{default_actions, Action};
use super::{Channel, Session};
use crate::domain::{names, Message};
use crate::infrastructure::metrics;
use crate::infrastructure::relay::{Broker, ReconnectPolicy, Relay, RelayError, Route, Topology};
use crate::shared::error::ChatError;

/// Channel created when nothing else is configured.
pub const DEFAULT_CHANNEL: &str = "default";

/// One chat instance. Sessions connect to it, channels belong to it and it
/// owns the relay that links it to the other instances.
pub struct Server {
    name: String,
    motd: String,
    text_limit: usize,
    text_interval: Duration,
    main_channel: String,
    channels: DashMap<String, Arc<Channel>>,
    actions: RwLock<BTreeMap<String, Arc<Action>>>,
    relay: OnceCell<Arc<Relay>>,
    this: Weak<Server>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn motd(&self) -> &str {
        &self.motd
    }

    pub fn text_limit(&self) -> usize {
        self.text_limit
    }

    pub fn text_interval(&self) -> Duration {
        self.text_interval
    }

    pub fn main_channel(&self) -> &str {
        &self.main_channel
    }

    /// Register a channel, returning the existing one if the name is taken.
    pub fn add_channel(&self, name: &str) -> Arc<Channel> {
        self.channels
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(channel = %name, "Registered channel");
                Arc::new(Channel::new(name, self.this.clone()))
            })
            .value()
            .clone()
    }

    pub fn channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.get(name).map(|entry| entry.value().clone())
    }

    /// All channels, sorted by name.
    pub fn list_channels(&self) -> Vec<Arc<Channel>> {
        let mut channels: Vec<Arc<Channel>> = self
            .channels
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        channels.sort_by(|a, b| a.name().cmp(b.name()));
        channels
    }

    /// Register an action under its tag, replacing any previous one.
    pub fn add_action(&self, action: Action) {
        let tag = action.tag();
        debug!(action = %tag, "Registered action");
        self.actions.write().insert(tag, Arc::new(action));
    }

    pub fn action(&self, tag: &str) -> Option<Arc<Action>> {
        self.actions.read().get(tag).cloned()
    }

    /// All actions, sorted by tag.
    pub fn list_actions(&self) -> Vec<Arc<Action>> {
        self.actions.read().values().cloned().collect()
    }

    /// Sessions seated on this instance.
    pub fn session_count(&self) -> usize {
        self.channels.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_connected(&self) -> bool {
        self.relay.get().is_some()
    }

    pub fn relay(&self) -> Option<&Arc<Relay>> {
        self.relay.get()
    }

    /// Attach the relay and start consuming this instance's queue.
    ///
    /// The returned task ends with an error if the consume stream breaks
    /// and cannot be reopened.
    pub async fn connect(
        self: &Arc<Self>,
        broker: Arc<dyn Broker>,
        topology: Topology,
        reconnect: ReconnectPolicy,
    ) -> Result<JoinHandle<Result<(), RelayError>>, ChatError> {
        if self.is_connected() {
            return Err(ChatError::AlreadyConnected);
        }
        let relay = Arc::new(Relay::new(broker, topology, reconnect));
        let deliveries = relay.subscribe().await?;
        self.relay
            .set(Arc::clone(&relay))
            .map_err(|_| ChatError::AlreadyConnected)?;
        info!(
            server = %self.name,
            broker = %relay.address(),
            queue = %relay.topology().queue,
            "Connected to message broker"
        );

        let router = Arc::downgrade(self) as Weak<dyn Route>;
        Ok(tokio::spawn(async move {
            relay.consume(deliveries, router).await
        }))
    }

    /// Create a session with a generated name and seat it.
    pub async fn accept(
        &self,
        outbound: mpsc::UnboundedSender<Message>,
    ) -> Result<Arc<Session>, ChatError> {
        self.accept_named(names::generate(), outbound).await
    }

    /// Create a session and seat it in the main channel: send the message
    /// of the day, make the main channel active and join it.
    pub async fn accept_named(
        &self,
        name: impl Into<String>,
        outbound: mpsc::UnboundedSender<Message>,
    ) -> Result<Arc<Session>, ChatError> {
        if !self.is_connected() {
            return Err(ChatError::NotConnected);
        }

        let session = Arc::new(Session::new(name, outbound, self.this.clone()));
        info!(user = %session.name(), server = %self.name, "Accepted connection");
        if let Err(e) = session.send(Message::chat(&self.name, &self.motd)) {
            debug!(user = %session.name(), error = %e, "Could not send message of the day");
        }

        let channel = self.add_channel(&self.main_channel);
        session.set_active(&channel);
        channel.join(&session).await;
        metrics::session_opened();
        Ok(session)
    }

    /// Hand a message to the relay. Without a relay the message is dropped.
    pub async fn publish(&self, message: Message) {
        match self.relay.get() {
            Some(relay) => relay.publish(&message).await,
            None => warn!(channel = %message.channel, "Not connected, dropping message"),
        }
    }
}

impl Route for Server {
    fn route(&self, message: Message) {
        match self.channel(&message.channel) {
            Some(channel) => {
                channel.deliver_locally(&message);
                metrics::record_relay("routed");
            }
            None => {
                warn!(channel = %message.channel, "Discarding message for unknown channel");
                metrics::record_relay("unroutable");
            }
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("name", &self.name)
            .field("main_channel", &self.main_channel)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Server`].
pub struct ServerBuilder {
    name: String,
    motd: String,
    text_limit: usize,
    text_interval: Duration,
    main_channel: String,
    channels: Vec<String>,
    actions: Vec<Action>,
    builtin_actions: bool,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            name: "WebChat".into(),
            motd: String::new(),
            text_limit: 140,
            text_interval: Duration::from_millis(10),
            main_channel: DEFAULT_CHANNEL.into(),
            channels: Vec::new(),
            actions: Vec::new(),
            builtin_actions: true,
        }
    }
}

impl ServerBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn motd(mut self, motd: impl Into<String>) -> Self {
        self.motd = motd.into();
        self
    }

    pub fn text_limit(mut self, limit: usize) -> Self {
        self.text_limit = limit;
        self
    }

    pub fn text_interval(mut self, interval: Duration) -> Self {
        self.text_interval = interval;
        self
    }

    /// Channel new sessions are seated in. Created on first accept if it
    /// was not registered.
    pub fn main_channel(mut self, name: impl Into<String>) -> Self {
        self.main_channel = name.into();
        self
    }

    pub fn channel(mut self, name: impl Into<String>) -> Self {
        self.channels.push(name.into());
        self
    }

    pub fn channels<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Skip `!help`, `!users` and `!channels`.
    pub fn without_builtin_actions(mut self) -> Self {
        self.builtin_actions = false;
        self
    }

    pub fn build(self) -> Arc<Server> {
        let server = Arc::new_cyclic(|this: &Weak<Server>| Server {
            name: self.name,
            motd: self.motd,
            text_limit: self.text_limit,
            text_interval: self.text_interval,
            main_channel: self.main_channel,
            channels: DashMap::new(),
            actions: RwLock::new(BTreeMap::new()),
            relay: OnceCell::new(),
            this: this.clone(),
        });

        for name in &self.channels {
            server.add_channel(name);
        }
        if self.builtin_actions {
            for action in default_actions() {
                server.add_action(action);
            }
        }
        for action in self.actions {
            server.add_action(action);
        }
        server
    }
}
