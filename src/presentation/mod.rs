//! Presentation Layer
//!
//! The websocket chat endpoint and the operational HTTP routes.

pub mod http;
pub mod middleware;
pub mod websocket;
