//! HTTP Surface
//!
//! Health probes, metrics and the static client.

pub mod handlers;
pub mod routes;
