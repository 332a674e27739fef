//! Chat Actions
//!
//! Named commands invoked by prefixing a line with the action's tag
//! (`!help`, `!party ...`). An action owns a [`Handler`]; cross-cutting
//! behavior such as throttling is added by wrapping that handler in another
//! one with the same shape:
//!
//! ```text
//! RateLimit ──wraps──> RateLimit ──wraps──> BroadcastResponse
//! ```

mod builtin;
mod rate_limit;
mod response;

pub use builtin::{default_actions, ListChannels, ListUsers, ShowHelp};
pub use rate_limit::RateLimit;
pub use response::{BroadcastResponse, PrivateResponse};

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::{Channel, Server, Session};
use crate::shared::error::ChatError;

/// Leading character of every action tag.
pub const ACTION_MARKER: char = '!';

/// Everything a handler may act on.
pub struct Invocation<'a> {
    pub server: &'a Server,
    pub channel: &'a Arc<Channel>,
    pub session: &'a Arc<Session>,
    /// Tag the action was invoked by, e.g. `!party`.
    pub tag: &'a str,
    /// Text after the tag, or the whole line for a bare command.
    pub argument: &'a str,
}

/// Action behavior. Middleware implements this trait too, holding the
/// handler it wraps.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, invocation: &Invocation<'_>) -> Result<(), ChatError>;
}

/// A registered command.
pub struct Action {
    name: String,
    description: String,
    handler: Arc<dyn Handler>,
}

impl Action {
    /// Create an action. A leading marker on `name` is ignored.
    pub fn new(
        name: impl AsRef<str>,
        description: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        Self {
            name: name.as_ref().trim_start_matches(ACTION_MARKER).to_string(),
            description: description.into(),
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Registry key: the name with its marker, e.g. `!help`.
    pub fn tag(&self) -> String {
        format!("{}{}", ACTION_MARKER, self.name)
    }

    pub async fn invoke(&self, invocation: &Invocation<'_>) -> Result<(), ChatError> {
        self.handler.invoke(invocation).await
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
