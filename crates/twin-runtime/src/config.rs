//! # Runtime Configuration
//!
//! Unified configuration for the event bus, the twins service and telemetry.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TWINS_BUS_CAPACITY` | `1000` | Events buffered per subscriber, at most `MAX_BUS_CAPACITY` |
//! | `TWINS_MAX_PAGE_LIMIT` | `100` | Largest accepted list page |
//! | `TWINS_AUTH_TOKENS` | empty | `token=principal` pairs, comma separated |
//! | `TWINS_TELEMETRY_CHANNELS` | empty | Channels consumed; empty consumes all |

use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use std::env;
use thiserror::Error;
use twin_telemetry::TelemetryConfig;
use twins::ServiceConfig;

/// Largest accepted `TWINS_BUS_CAPACITY`.
///
/// Every subscriber preallocates this many slots.
pub const MAX_BUS_CAPACITY: usize = 1 << 20;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric variable did not parse, was zero or was out of range.
    #[error("{name} must be a positive integer in range, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    /// A credential entry is not of the form `token=principal`.
    #[error("malformed credential entry {0:?}, expected token=principal")]
    MalformedCredential(String),
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Events buffered per bus subscriber before it lags.
    pub bus_capacity: usize,
    /// Twins service configuration.
    pub service: ServiceConfig,
    /// Accepted credentials as (token, principal).
    pub credentials: Vec<(String, String)>,
    /// Telemetry channels the state consumer listens to.
    pub telemetry_channels: Vec<String>,
    /// Logging configuration.
    pub telemetry: TelemetryConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
            service: ServiceConfig::default(),
            credentials: Vec::new(),
            telemetry_channels: Vec::new(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self {
            telemetry: TelemetryConfig::from_env(),
            ..Self::default()
        };

        if let Ok(value) = env::var("TWINS_BUS_CAPACITY") {
            config.bus_capacity = parse_capacity(&value)?;
        }
        if let Ok(value) = env::var("TWINS_MAX_PAGE_LIMIT") {
            config.service.max_page_limit = parse_positive("TWINS_MAX_PAGE_LIMIT", &value)?;
        }
        if let Ok(value) = env::var("TWINS_AUTH_TOKENS") {
            config.credentials = parse_credentials(&value)?;
        }
        if let Ok(value) = env::var("TWINS_TELEMETRY_CHANNELS") {
            config.telemetry_channels = parse_list(&value);
        }

        Ok(config)
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_capacity(value: &str) -> Result<usize, ConfigError> {
    let name = "TWINS_BUS_CAPACITY";
    let n = parse_positive(name, value)?;
    match usize::try_from(n) {
        Ok(capacity) if capacity <= MAX_BUS_CAPACITY => Ok(capacity),
        _ => Err(ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `token=principal,token=principal` into pairs.
pub fn parse_credentials(value: &str) -> Result<Vec<(String, String)>, ConfigError> {
    parse_list(value)
        .into_iter()
        .map(|entry| match entry.split_once('=') {
            Some((token, principal)) if !token.trim().is_empty() && !principal.trim().is_empty() => {
                Ok((token.trim().to_string(), principal.trim().to_string()))
            }
            _ => Err(ConfigError::MalformedCredential(entry)),
        })
        .collect()
}
