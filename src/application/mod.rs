//! Application Layer
//!
//! The chat model: a [`Server`] owns [`Channel`]s and the action registry,
//! a [`Session`] is one connected user. Messages posted to a channel go out
//! through the relay and come back in through [`Server`]'s `Route`
//! implementation before any member sees them.

pub mod actions;
pub mod blueprint;
mod channel;
mod server;
mod session;

pub use blueprint::build_server;
pub use channel::Channel;
pub use server::{Server, ServerBuilder, DEFAULT_CHANNEL};
pub use session::{split_command, InputGate, Session};
