//! Actions every server registers on construction.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Action, Handler, Invocation};
use crate::domain::Message;
use crate::shared::error::ChatError;

/// `!help`: list every registered action tag.
pub struct ShowHelp;

#[async_trait]
impl Handler for ShowHelp {
    async fn invoke(&self, invocation: &Invocation<'_>) -> Result<(), ChatError> {
        let tags: Vec<String> = invocation
            .server
            .list_actions()
            .iter()
            .map(|action| action.tag())
            .collect();
        reply(invocation, format!("Available actions are {}.", tags.join(", ")))
    }
}

/// `!users`: list the members of the invoker's channel on this instance.
pub struct ListUsers;

#[async_trait]
impl Handler for ListUsers {
    async fn invoke(&self, invocation: &Invocation<'_>) -> Result<(), ChatError> {
        let names = invocation.channel.member_names();
        reply(
            invocation,
            format!("Users in {}: {}.", invocation.channel.name(), names.join(", ")),
        )
    }
}

/// `!channels`: list the channels of this server, marking the active one.
pub struct ListChannels;

#[async_trait]
impl Handler for ListChannels {
    async fn invoke(&self, invocation: &Invocation<'_>) -> Result<(), ChatError> {
        let names: Vec<String> = invocation
            .server
            .list_channels()
            .iter()
            .map(|channel| {
                if Arc::ptr_eq(channel, invocation.channel) {
                    format!("{} (active)", channel.name())
                } else {
                    channel.name().to_string()
                }
            })
            .collect();
        reply(invocation, format!("Channels are {}.", names.join(", ")))
    }
}

fn reply(invocation: &Invocation<'_>, text: String) -> Result<(), ChatError> {
    invocation.session.send(
        Message::notice(invocation.server.name(), text).with_channel(invocation.channel.name()),
    )
}

/// The built-in action set.
pub fn default_actions() -> Vec<Action> {
    vec![
        Action::new("help", "List available actions", Arc::new(ShowHelp)),
        Action::new("users", "List users in this channel", Arc::new(ListUsers)),
        Action::new("channels", "List channels", Arc::new(ListChannels)),
    ]
}
