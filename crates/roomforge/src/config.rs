//! Server configuration, loaded from `ROOMFORGE_*` environment variables.
//!
//! Top-level keys map directly (`ROOMFORGE_BIND_ADDR`); room settings are
//! nested with a double underscore (`ROOMFORGE_ROOM__BOARD_SIZE`). Anything
//! unset keeps its default.

use std::time::Duration;

use config::{Config, Environment};
use roomforge_room::RoomConfig;
use serde::{Deserialize, Serialize};

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Default upper bound on a single outbound write, in milliseconds.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 5_000;

const ENV_PREFIX: &str = "ROOMFORGE";

/// Configuration that could not be loaded or used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was present but could not be read as the expected type.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value parsed but is out of range.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// The setting at fault, as a config key.
        field: &'static str,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// Everything the binary needs to start a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// How long a single write to a client may take before the connection
    /// is dropped.
    pub send_timeout_ms: u64,
    /// Settings applied to every room.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(environment())
    }

    fn load(source: Environment) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that deserialize fine but can't be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        if self.bind_addr.trim().is_empty() {
            return invalid("bind_addr", "must not be empty");
        }
        if self.send_timeout_ms == 0 {
            return invalid("send_timeout_ms", "must be greater than zero");
        }
        if self.room.board_size == 0 {
            return invalid("room.board_size", "must be greater than zero");
        }
        if self.room.outbound_capacity == 0 {
            return invalid("room.outbound_capacity", "must be greater than zero");
        }
        if self.room.command_channel_size == 0 {
            return invalid("room.command_channel_size", "must be greater than zero");
        }
        Ok(())
    }

    /// The write timeout as a [`Duration`].
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
