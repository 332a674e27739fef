//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Active chat sessions gauge
//! - Input frames dropped by the session gates, by reason
//! - Relay traffic by outcome
//! - Action invocations by tag and outcome

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Sessions currently seated in a channel on this instance
pub static SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("sessions_active", "Number of connected chat sessions").namespace("webchat"),
    )
    .expect("Failed to create SESSIONS_ACTIVE metric")
});

/// Frames silently dropped before dispatch
pub static FRAMES_DROPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("frames_dropped_total", "Inbound frames dropped by input policy")
            .namespace("webchat"),
        &["reason"], // "rate", "length", "empty"
    )
    .expect("Failed to create FRAMES_DROPPED_TOTAL metric")
});

/// Relay publish/consume outcomes
pub static RELAY_MESSAGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relay_messages_total", "Messages handled by the broker relay")
            .namespace("webchat"),
        &["outcome"], // "published", "publish_failed", "routed", "unroutable", "malformed"
    )
    .expect("Failed to create RELAY_MESSAGES_TOTAL metric")
});

/// Action invocations
pub static ACTION_INVOCATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("action_invocations_total", "Chat action invocations").namespace("webchat"),
        &["action", "outcome"], // outcome: "ok", "error", "throttled"
    )
    .expect("Failed to create ACTION_INVOCATIONS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(SESSIONS_ACTIVE.clone()))
        .expect("Failed to register SESSIONS_ACTIVE");
    registry
        .register(Box::new(FRAMES_DROPPED_TOTAL.clone()))
        .expect("Failed to register FRAMES_DROPPED_TOTAL");
    registry
        .register(Box::new(RELAY_MESSAGES_TOTAL.clone()))
        .expect("Failed to register RELAY_MESSAGES_TOTAL");
    registry
        .register(Box::new(ACTION_INVOCATIONS_TOTAL.clone()))
        .expect("Failed to register ACTION_INVOCATIONS_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record a dropped inbound frame
pub fn record_dropped_frame(reason: &str) {
    FRAMES_DROPPED_TOTAL.with_label_values(&[reason]).inc();
}

/// Helper to record a relay outcome
pub fn record_relay(outcome: &str) {
    RELAY_MESSAGES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Helper to record an action invocation
pub fn record_action(action: &str, outcome: &str) {
    ACTION_INVOCATIONS_TOTAL
        .with_label_values(&[action, outcome])
        .inc();
}

/// Helper to track session seat/unseat
pub fn session_opened() {
    SESSIONS_ACTIVE.inc();
}

pub fn session_closed() {
    SESSIONS_ACTIVE.dec();
}
