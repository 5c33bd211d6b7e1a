//! Configuration management for Gatekeeper.
//!
//! Configuration is read once at startup and never mutated afterwards. Values
//! come from an optional YAML file, overridden by `GATEKEEPER__`-prefixed
//! environment variables (`GATEKEEPER__AUTH__SECRET_KEY`, ...).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

use crate::error::{GatekeeperError, Result};

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "GATEKEEPER";

/// Upper bound for any configured duration (100 years).
const MAX_DURATION_SECS: u64 = 100 * 365 * 24 * 3600;

/// Main configuration for the Gatekeeper service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatekeeperConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Token configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Users accepted by the in-memory credential store
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

/// One `{identity, secret}` pair for the in-memory credential store.
///
/// Identities are values rather than map keys because the `config` crate
/// lowercases keys, and identities are case-sensitive.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub identity: String,
    pub secret: String,
}

impl fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserEntry")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// gRPC server address
    #[serde(default = "default_grpc_addr")]
    pub grpc_addr: SocketAddr,

    /// Default log filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// How often idle rate windows are swept, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grpc_addr: default_grpc_addr(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_grpc_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sweep_interval() -> u64 {
    60
}

/// Token configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Key material used to sign tokens. Must not be empty.
    #[serde(default)]
    pub secret_key: String,

    /// Maximum token age in seconds
    #[serde(default = "default_token_max_age")]
    pub token_max_age_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            token_max_age_secs: default_token_max_age(),
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("token_max_age_secs", &self.token_max_age_secs)
            .finish()
    }
}

fn default_token_max_age() -> u64 {
    3600
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Maximum requests per identity within the interval
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Length of the sliding window in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            interval_secs: default_interval(),
        }
    }
}

fn default_limit() -> usize {
    5
}

fn default_interval() -> u64 {
    60
}

impl GatekeeperConfig {
    /// Load configuration from an optional YAML file plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(
                config::File::from(path).format(config::FileFormat::Yaml),
            );
        }

        let config: GatekeeperConfig = builder
            .add_source(
                // No type guessing: a secret of `00123` stays `00123`.
                config::Environment::with_prefix(ENV_PREFIX).separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: GatekeeperConfig = serde_yaml::from_str(yaml)
            .map_err(|e| GatekeeperError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would leave the gateway open or unusable.
    pub fn validate(&self) -> Result<()> {
        if self.auth.secret_key.is_empty() {
            return Err(GatekeeperError::Config(
                "auth.secret_key must be set".to_string(),
            ));
        }
        if self.auth.token_max_age_secs == 0 {
            return Err(GatekeeperError::Config(
                "auth.token_max_age_secs must be greater than zero".to_string(),
            ));
        }
        if self.auth.token_max_age_secs > MAX_DURATION_SECS
            || self.rate_limiting.interval_secs > MAX_DURATION_SECS
        {
            return Err(GatekeeperError::Config(format!(
                "durations must not exceed {} seconds",
                MAX_DURATION_SECS
            )));
        }
        if self.rate_limiting.limit == 0 {
            return Err(GatekeeperError::Config(
                "rate_limiting.limit must be at least 1".to_string(),
            ));
        }
        if self.rate_limiting.interval_secs == 0 {
            return Err(GatekeeperError::Config(
                "rate_limiting.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.server.sweep_interval_secs == 0 {
            return Err(GatekeeperError::Config(
                "server.sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for user in &self.users {
            if !seen.insert(user.identity.as_str()) {
                return Err(GatekeeperError::Config(format!(
                    "users: identity '{}' is listed more than once",
                    user.identity
                )));
            }
        }
        Ok(())
    }
}
