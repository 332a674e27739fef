//! Domain Layer
//!
//! Value types shared by every other layer: the chat message carried to
//! clients and across the broker, and display name generation.

pub mod message;
pub mod names;

pub use message::{Message, Priority};
