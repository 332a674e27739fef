//! Channel membership and local fan-out.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{Server, Session};
use crate::domain::Message;

/// A named room. Membership is local to this instance; traffic always goes
/// through the relay so members on every instance see it.
pub struct Channel {
    name: String,
    host: Weak<Server>,
    members: Mutex<HashMap<String, Arc<Session>>>,
}

impl Channel {
    pub fn new(name: impl Into<String>, host: Weak<Server>) -> Self {
        Self {
            name: name.into(),
            host,
            members: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sorted names of the sessions seated here.
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.members.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }

    /// Whether this exact session holds the membership entry for its name.
    pub fn contains(&self, session: &Arc<Session>) -> bool {
        self.members
            .lock()
            .get(session.name())
            .is_some_and(|member| Arc::ptr_eq(member, session))
    }

    /// Seat a session and announce it. A member with the same name is replaced.
    pub async fn join(&self, session: &Arc<Session>) {
        let replaced = self
            .members
            .lock()
            .insert(session.name().to_string(), Arc::clone(session))
            .is_some();
        info!(
            user = %session.name(),
            channel = %self.name,
            replaced,
            "User joined channel"
        );
        self.announce(format!("{} joined the channel", session.name()))
            .await;
    }

    /// Remove a session and announce its departure.
    ///
    /// Returns `false` without announcing anything if the session no longer
    /// holds its entry, either because it already left or because a session
    /// with the same name replaced it.
    pub async fn leave(&self, session: &Arc<Session>) -> bool {
        let removed = {
            let mut members = self.members.lock();
            match members.get(session.name()) {
                Some(member) if Arc::ptr_eq(member, session) => {
                    members.remove(session.name());
                    true
                }
                _ => false,
            }
        };
        if removed {
            info!(user = %session.name(), channel = %self.name, "User left channel");
            self.announce(format!("{} left the channel", session.name()))
                .await;
        }
        removed
    }

    /// Stamp the message with this channel and hand it to the relay.
    /// Nothing is delivered locally until the message comes back from the
    /// broker.
    pub async fn publish(&self, message: Message) {
        let message = message.with_channel(&self.name);
        match self.host.upgrade() {
            Some(server) => server.publish(message).await,
            None => warn!(channel = %self.name, "Server gone, dropping message"),
        }
    }

    /// Push a message into the outbound queue of every member.
    pub fn deliver_locally(&self, message: &Message) {
        let members = self.members.lock();
        debug!(
            channel = %self.name,
            sender = %message.sender,
            recipients = members.len(),
            "Delivering message"
        );
        for (name, member) in members.iter() {
            if let Err(e) = member.send(message.clone()) {
                warn!(user = %name, channel = %self.name, error = %e, "Failed to deliver message");
            }
        }
    }

    async fn announce(&self, text: String) {
        let Some(server) = self.host.upgrade() else {
            return;
        };
        self.publish(Message::notice(server.name(), text)).await;
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("members", &self.member_names())
            .finish()
    }
}
