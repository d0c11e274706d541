use gamepass::config::{Config as GamepassConfig, ValidationError};
use serde::Deserialize;
use std::fs::File;

/// Environment variable holding the upstream API key.
pub const API_KEY_ENV: &str = "GAMEPASS_API_KEY";
/// Environment variable overriding the listener port.
pub const PORT_ENV: &str = "PORT";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default)]
    pub gamepass: GamepassConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Applies environment overrides. `lookup` is `std::env::var` in
    /// production.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.gamepass.api_key = Some(key);
        }

        if let Some(port) = lookup(PORT_ENV) {
            self.gamepass.listener.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv(PORT_ENV, port))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gamepass.validate()?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid value for {0}: {1:?}")]
    InvalidEnv(&'static str, String),
    #[error("invalid config: {0}")]
    ValidationError(#[from] ValidationError),
}
