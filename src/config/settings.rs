//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Message broker configuration
    pub broker: BrokerSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Chat rooms, limits and actions
    pub chat: ChatSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,

    /// Directory with the browser client, served at `/` when present
    #[serde(default)]
    pub static_dir: Option<String>,
}

/// Message broker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerSettings {
    /// Broker URL: `redis://host:port` or `memory://`
    pub url: String,

    /// Topic exchange shared by all instances
    pub exchange: String,

    /// Attempts to reopen a broken consume stream before giving up
    pub reconnect_attempts: u32,

    /// Delay before each reopen attempt in milliseconds
    pub reconnect_delay_ms: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Chat server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    pub general: GeneralSettings,

    /// Channels created at startup
    #[serde(default)]
    pub channels: Vec<String>,

    /// Operator-defined actions
    #[serde(default)]
    pub actions: Vec<ActionSettings>,
}

/// Server identity and input limits.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralSettings {
    /// Display name used as sender of server notices
    pub name: String,

    /// Message of the day sent to every new session
    pub motd: String,

    /// Channel new sessions are seated in
    pub main_channel: String,

    /// Maximum frame length in characters
    pub character_limit: usize,

    /// Minimum interval between two frames of one session in milliseconds
    pub message_interval_ms: u64,
}

/// One configured action.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionSettings {
    /// Command tag without the leading marker
    pub tag: String,

    #[serde(default)]
    pub description: String,

    /// Response shape
    #[serde(rename = "type")]
    pub kind: ResponseKind,

    /// Response payload
    #[serde(default)]
    pub data: String,

    /// Media tag of the response, e.g. "image"
    #[serde(default)]
    pub media: String,

    /// Middleware applied in order, each wrapping the previous result
    #[serde(default)]
    pub middleware: Vec<MiddlewareSettings>,
}

/// Who receives an action's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Private,
    Broadcast,
}

/// Middleware wrapping an action handler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MiddlewareSettings {
    /// Throttle the action: at most one run per `interval` seconds
    Limit {
        interval: u64,
        #[serde(default)]
        message: String,
    },
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if a chat limit is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Self::builder(&environment)?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Load from environment variables
            // APP__SERVER__PORT=8080 -> server.port = 8080
            .add_source(Self::environment())
            // Map simple environment variables
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option(
                "server.port",
                std::env::var("SERVER_PORT")
                    .ok()
                    .or_else(|| std::env::var("PORT").ok()),
            )?
            .set_override_option("broker.url", std::env::var("BROKER_URL").ok())?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    /// Parse settings from a TOML document layered over the defaults.
    pub fn from_toml(document: &str) -> Result<Self, ConfigError> {
        Self::builder("development")?
            .add_source(File::from_str(document, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    /// `APP__`-prefixed variables. `APP__CORS__ALLOWED_ORIGINS=a,b` is a list.
    fn environment() -> Environment {
        Environment::default()
            .prefix("APP")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("cors.allowed_origins")
    }

    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Start with default values
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("broker.url", "memory://")?
            .set_default("broker.exchange", "chat")?
            .set_default("broker.reconnect_attempts", 5)?
            .set_default("broker.reconnect_delay_ms", 1000)?
            .set_default("cors.allowed_origins", Vec::<String>::new())?
            .set_default("chat.general.name", "WebChat")?
            .set_default("chat.general.motd", "Welcome to WebChat!")?
            .set_default("chat.general.main_channel", "default")?
            .set_default("chat.general.character_limit", 140)?
            .set_default("chat.general.message_interval_ms", 10)
    }

    fn validate(settings: Self) -> Result<Self, ConfigError> {
        let general = &settings.chat.general;
        if general.character_limit == 0 {
            return Err(ConfigError::Message(
                "chat.general.character_limit must be greater than zero".into(),
            ));
        }
        if !settings.chat.channels.is_empty()
            && !settings.chat.channels.contains(&general.main_channel)
        {
            return Err(ConfigError::Message(format!(
                "chat.general.main_channel '{}' is not one of the configured channels",
                general.main_channel
            )));
        }
        if let Some(action) = settings.chat.actions.iter().find(|a| a.tag.trim().is_empty()) {
            return Err(ConfigError::Message(format!(
                "action with data '{}' has an empty tag",
                action.data
            )));
        }
        Ok(settings)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl GeneralSettings {
    pub fn message_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.message_interval_ms)
    }
}
