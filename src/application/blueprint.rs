//! Building a server from configuration.

use std::sync::Arc;
use std::time::Duration;

use super::actions::{Action, BroadcastResponse, Handler, PrivateResponse, RateLimit};
use super::Server;
use crate::config::{ActionSettings, ChatSettings, MiddlewareSettings, ResponseKind};

/// Server with the configured identity, limits, channels and actions.
pub fn build_server(settings: &ChatSettings) -> Arc<Server> {
    let general = &settings.general;
    let mut builder = Server::builder()
        .name(&general.name)
        .motd(&general.motd)
        .text_limit(general.character_limit)
        .text_interval(general.message_interval())
        .main_channel(&general.main_channel)
        .channels(settings.channels.iter().cloned());

    for action in &settings.actions {
        builder = builder.action(build_action(action, &general.name));
    }
    builder.build()
}

/// Action from its settings. Middleware wraps in list order, so the last
/// entry is outermost. Private replies are sent as `sender`.
pub fn build_action(settings: &ActionSettings, sender: &str) -> Action {
    let mut handler: Arc<dyn Handler> = match settings.kind {
        ResponseKind::Private => Arc::new(PrivateResponse::new(
            sender,
            &settings.data,
            &settings.media,
        )),
        ResponseKind::Broadcast => Arc::new(BroadcastResponse::new(&settings.data, &settings.media)),
    };

    for middleware in &settings.middleware {
        handler = match middleware {
            MiddlewareSettings::Limit { interval, message } => Arc::new(RateLimit::new(
                handler,
                Duration::from_secs(*interval),
                message.clone(),
            )),
        };
    }

    Action::new(&settings.tag, &settings.description, handler)
}
