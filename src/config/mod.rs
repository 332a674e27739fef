//! # Configuration Module
//!
//! This module handles application configuration loading and management.
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__, plus PORT and BROKER_URL)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use webchat::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Relaying through {}", settings.broker.url);
//! ```

mod settings;

pub use settings::*;
