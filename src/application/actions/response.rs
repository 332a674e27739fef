//! Response shapes for configured actions.

use async_trait::async_trait;

use super::{Handler, Invocation};
use crate::domain::Message;
use crate::shared::error::ChatError;

/// Reply to the invoking session only.
#[derive(Debug, Clone)]
pub struct PrivateResponse {
    sender: String,
    data: String,
    media: String,
}

impl PrivateResponse {
    pub fn new(
        sender: impl Into<String>,
        data: impl Into<String>,
        media: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            data: data.into(),
            media: media.into(),
        }
    }
}

#[async_trait]
impl Handler for PrivateResponse {
    async fn invoke(&self, invocation: &Invocation<'_>) -> Result<(), ChatError> {
        invocation.session.send(
            Message::chat(&self.sender, &self.data)
                .with_media(&self.media)
                .with_channel(invocation.channel.name()),
        )
    }
}

/// Post to the invoking channel on behalf of the invoker.
#[derive(Debug, Clone)]
pub struct BroadcastResponse {
    data: String,
    media: String,
}

impl BroadcastResponse {
    pub fn new(data: impl Into<String>, media: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media: media.into(),
        }
    }
}

#[async_trait]
impl Handler for BroadcastResponse {
    async fn invoke(&self, invocation: &Invocation<'_>) -> Result<(), ChatError> {
        invocation
            .channel
            .publish(Message::chat(invocation.session.name(), &self.data).with_media(&self.media))
            .await;
        Ok(())
    }
}
