//! Chat message value object.
//!
//! The same JSON shape is written to browser clients and carried over the
//! broker between server instances, so the field names are part of the
//! external contract.

use serde::{Deserialize, Serialize};

/// Display priority hint for clients.
///
/// Low-priority messages may be rendered muted; nothing is ever dropped
/// because of its priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    /// No hint, the client renders it as regular chat text.
    #[default]
    #[serde(rename = "")]
    Normal,
    #[serde(rename = "primary")]
    High,
    #[serde(rename = "muted")]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::High => "primary",
            Self::Low => "muted",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single chat event.
///
/// `channel` names the routing target. `media` is a free-form tag such as
/// `"image"`, empty for plain text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub sender: String,
    pub data: String,
    pub priority: Priority,
    pub channel: String,
    pub media: String,
}

impl Message {
    /// Plain chat text from a user.
    pub fn chat(sender: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            data: data.into(),
            ..Self::default()
        }
    }

    /// Low-priority notice, used for join/leave events and private replies.
    pub fn notice(sender: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            data: data.into(),
            priority: Priority::Low,
            ..Self::default()
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = media.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Encode to the wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode from the wire form.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
