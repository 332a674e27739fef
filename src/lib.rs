//! # WebChat Library
//!
//! A websocket chatroom server meant to run as several identical instances.
//! Every message posted to a channel is published to a topic exchange on a
//! pub/sub broker; each instance consumes its own queue bound to that
//! exchange and delivers the message to the members it hosts.
//!
//! ## Module Structure
//!
//! ```text
//! webchat/
//! +-- config/         Configuration management
//! +-- domain/         Wire message and generated user names
//! +-- application/    Server, channels, sessions and actions
//! +-- infrastructure/ Broker relay and metrics
//! +-- presentation/   WebSocket endpoint, health and metrics routes
//! +-- shared/         Error types
//! ```

// Configuration module
pub mod config;

// Domain layer
pub mod domain;

// Application layer - chat model
pub mod application;

// Infrastructure layer - broker relay and metrics
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
