//! Configuration for the prediction server.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. The file passed with `--config` (required when given)
//! 4. Environment variables with the `REGRESS_SERVE_` prefix, nested with
//!    `__` (for example `REGRESS_SERVE_SERVER__PORT=9000`)
//! 5. `MODEL_PATH`, which overrides `model.path`
//!
//! Command line flags are applied on top by the binary.

mod sub_configs;


use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub use sub_configs::{LogFormat, LoggingConfig, ModelConfig, ServerConfig};

/// Artifact path used when nothing else is configured.
pub const DEFAULT_MODEL_PATH: &str = "models/model.json";

/// Environment variable overriding `model.path`.
pub const MODEL_PATH_ENV: &str = "MODEL_PATH";

/// Prefix of structured environment overrides.
pub const ENV_PREFIX: &str = "REGRESS_SERVE";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServeConfig {
    pub model: ModelConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl ServeConfig {
    /// Load configuration from files and environment.
    ///
    /// Not validated: command line overrides still apply on top, so callers
    /// run [`validate`](Self::validate) once the last layer is in place.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`] if `explicit` does not exist
    /// - [`ConfigError::Parse`] if a source cannot be parsed
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    reason: "file not found".to_string(),
                });
            }
            builder = builder.add_source(config::File::from(path));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: ServeConfig = builder.build()?.try_deserialize()?;
        config.apply_model_path_env();
        Ok(config)
    }

    /// Load configuration from a single TOML file, without environment overrides.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: ServeConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn apply_model_path_env(&mut self) {
        if let Ok(path) = std::env::var(MODEL_PATH_ENV) {
            if !path.is_empty() {
                self.model.path = path;
            }
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "model.path",
                message: "must not be empty".to_string(),
            });
        }

        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "server.bind_address",
                message: "must not be empty".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                field: "server.port",
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// `host:port` string for the listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }
}
