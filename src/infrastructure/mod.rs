//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Broker relay (Redis pub/sub, in-process fan-out)
//! - Prometheus metrics

pub mod metrics;
pub mod relay;
