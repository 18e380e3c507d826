//! Configuration management for the `MapRoute` agent
//!
//! Handles loading configuration from files and environment variables
//! and validates every setting before the server starts.

use crate::MapRouteError;
use crate::retry::RetryPolicy;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding a key shared by both LocationIQ clients
const SHARED_API_KEY_VAR: &str = "LOCATIONIQ_API_KEY";

/// Root configuration structure for the `MapRoute` agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapRouteConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Geocoding provider settings
    #[serde(default)]
    pub geocoding: ProviderConfig,
    /// Routing provider settings
    #[serde(default)]
    pub routing: ProviderConfig,
    /// Request pipeline settings
    #[serde(default)]
    pub agent: AgentConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// PEM certificate, enables TLS together with `tls_key_path`
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
    /// Largest accepted webhook body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Settings for one external provider (geocoding or routing)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider API key
    pub api_key: Option<String>,
    /// Base URL of the provider API
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Timeout for a single request in milliseconds
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
    /// Total attempts per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on every further retry
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Upper bound for a single backoff delay
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    /// Wall-clock budget for all attempts of one call
    #[serde(default = "default_budget_ms")]
    pub budget_ms: u64,
}

/// Request pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Deadline for one message, from parsing to the formatted reply
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty, compact or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP endpoint for trace export; disabled when unset
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_provider_base_url() -> String {
    "https://us1.locationiq.com/v1".to_string()
}

fn default_attempt_timeout_ms() -> u64 {
    8_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_cap_ms() -> u64 {
    4_000
}

fn default_budget_ms() -> u64 {
    12_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls_cert_path: None,
            tls_key_path: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_provider_base_url(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            budget_ms: default_budget_ms(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl ProviderConfig {
    /// Retry limits derived from this provider's settings
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.backoff_cap_ms),
            attempt_timeout: self.attempt_timeout(),
            total_budget: Duration::from_millis(self.budget_ms),
        }
    }

    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// The configured key; only valid after `MapRouteConfig::validate`
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    fn validate(&self, name: &str) -> Result<()> {
        match self.api_key.as_deref() {
            None | Some("") => {
                return Err(MapRouteError::config(format!(
                    "{name} API key is required. Set MAPROUTE_{}__API_KEY or {SHARED_API_KEY_VAR}.",
                    name.to_uppercase()
                ))
                .into());
            }
            Some(key) if key.len() < 8 || key.len() > 128 => {
                return Err(MapRouteError::config(format!(
                    "{name} API key appears to be invalid (expected 8-128 characters)."
                ))
                .into());
            }
            Some(_) => {}
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(MapRouteError::config(format!(
                "{name} base URL must be a valid HTTP or HTTPS URL"
            ))
            .into());
        }

        if !(1..=10).contains(&self.max_attempts) {
            return Err(MapRouteError::validation(format!(
                "{name} max attempts must be between 1 and 10"
            ))
            .into());
        }

        for (field, value) in [
            ("attempt timeout", self.attempt_timeout_ms),
            ("budget", self.budget_ms),
            ("backoff base", self.backoff_base_ms),
            ("backoff cap", self.backoff_cap_ms),
        ] {
            validate_millis(name, field, value)?;
        }

        if self.backoff_base_ms > self.backoff_cap_ms {
            return Err(MapRouteError::validation(format!(
                "{name} backoff base cannot exceed the backoff cap"
            ))
            .into());
        }

        Ok(())
    }
}

fn validate_millis(name: &str, field: &str, value: u64) -> Result<()> {
    if value == 0 || value > 300_000 {
        return Err(MapRouteError::validation(format!(
            "{name} {field} must be between 1 ms and 300 seconds"
        ))
        .into());
    }
    Ok(())
}

impl AgentConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl MapRouteConfig {
    /// Load configuration from `config_path`, else the default locations,
    /// then apply environment overrides
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with MAPROUTE_ prefix
        builder = builder.add_source(
            Environment::with_prefix("MAPROUTE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: MapRouteConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_shared_key(std::env::var(SHARED_API_KEY_VAR).ok());

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("maproute").join("config.toml"))
    }

    /// Fill provider keys that were not set individually
    pub fn apply_shared_key(&mut self, shared: Option<String>) {
        let Some(shared) = shared.filter(|key| !key.is_empty()) else {
            return;
        };
        for provider in [&mut self.geocoding, &mut self.routing] {
            if provider.api_key.as_deref().is_none_or(str::is_empty) {
                provider.api_key = Some(shared.clone());
            }
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.geocoding.validate("Geocoding")?;
        self.routing.validate("Routing")?;
        validate_millis("Agent", "request timeout", self.agent.request_timeout_ms)?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MapRouteError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "compact", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MapRouteError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(MapRouteError::config(
                "TLS needs both tls_cert_path and tls_key_path",
            )
            .into());
        }

        Ok(())
    }
}
