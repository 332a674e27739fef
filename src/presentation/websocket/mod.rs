//! WebSocket Endpoint
//!
//! Chat clients connect at `/chat`.

pub mod handler;

pub use handler::ws_handler;
