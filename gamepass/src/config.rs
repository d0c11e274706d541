use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_GAMES_URL: &str = "https://apis.roblox.com/game-passes/v1";
const DEFAULT_INVENTORY_URL: &str = "https://inventory.roblox.com/v1";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Upstream timeout cannot be 0")]
    InvalidTimeout,

    #[error("Upstream URL must be http(s) with a host: {0}")]
    InvalidUpstreamUrl(String),

    #[error("Invalid API key header name: {0}")]
    InvalidHeaderName(String),

    #[error("Empty entry in allowed_hosts")]
    EmptyAllowedHost,
}

/// Network listener configuration
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Where and how the upstream platform is reached.
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base of the game-passes API. Created-gamepass listings and universe
    /// listings hang off this URL.
    pub games_url: Url,
    /// Base of the inventory API used for ownership checks.
    pub inventory_url: Url,
    pub api_key_header: String,
    /// Applies to the whole request, including reading the body.
    pub timeout_secs: u64,
    /// Hosts reachable through the generic forwarding endpoint. When empty the
    /// hosts of `games_url` and `inventory_url` are allowed.
    pub allowed_hosts: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            games_url: Url::parse(DEFAULT_GAMES_URL).expect("default games url is valid"),
            inventory_url: Url::parse(DEFAULT_INVENTORY_URL)
                .expect("default inventory url is valid"),
            api_key_header: "x-api-key".into(),
            timeout_secs: 10,
            allowed_hosts: Vec::new(),
        }
    }
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for url in [&self.games_url, &self.inventory_url] {
            let scheme_ok = matches!(url.scheme(), "http" | "https");
            if !scheme_ok || url.host_str().is_none() {
                return Err(ValidationError::InvalidUpstreamUrl(url.to_string()));
            }
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        if http::HeaderName::from_bytes(self.api_key_header.as_bytes()).is_err() {
            return Err(ValidationError::InvalidHeaderName(
                self.api_key_header.clone(),
            ));
        }

        if self.allowed_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(ValidationError::EmptyAllowedHost);
        }

        Ok(())
    }

    /// Hosts the forwarding endpoint may talk to.
    pub fn forwardable_hosts(&self) -> Vec<String> {
        if !self.allowed_hosts.is_empty() {
            return self
                .allowed_hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .collect();
        }

        let mut hosts: Vec<String> = [&self.games_url, &self.inventory_url]
            .iter()
            .filter_map(|url| url.host_str().map(str::to_ascii_lowercase))
            .collect();
        hosts.dedup();
        hosts
    }
}

/// Which upstream endpoint answers ownership questions. The two styles hit
/// different endpoints with different semantics and are never combined.
#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipStyle {
    /// Inventory item listing; a non-empty `data` list means owned.
    #[default]
    Inventory,
    /// `is-owned` endpoint answering with the literal text `true` or `false`.
    IsOwned,
}

#[derive(Clone, Deserialize, Debug, Default, PartialEq)]
pub struct OwnershipConfig {
    #[serde(default)]
    pub style: OwnershipStyle,
}

#[derive(Clone, Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub ownership: OwnershipConfig,
    /// Credential for key-authenticated upstream endpoints. Usually supplied
    /// through the environment rather than the config file.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.upstream.validate()?;
        Ok(())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}
