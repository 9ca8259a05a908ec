//! Configuration management for `WeatherDash`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherDashError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `WeatherDash` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherDashConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Forecast provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Persistent storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Login session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// OpenTelemetry export configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_server_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// PEM certificate path; HTTPS is served when both cert and key are set
    pub tls_cert_path: Option<String>,
    /// PEM private key path
    pub tls_key_path: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    /// Maximum accepted request body in KB
    #[serde(default = "default_max_body_kb")]
    pub max_body_kb: u32,
    /// Directory with static assets served under `/assets`
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
}

/// Forecast provider (OpenWeatherMap) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    /// Base URL for the provider API
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_provider_max_retries")]
    pub max_retries: u32,
    /// Language for weather descriptions
    #[serde(default = "default_provider_language")]
    pub language: String,
}

/// Persistent storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the user and cache keyspaces
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// How long provider responses are cached, in minutes
    #[serde(default = "default_forecast_cache_minutes")]
    pub forecast_cache_minutes: u32,
}

/// Login session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in hours
    #[serde(default = "default_session_ttl")]
    pub ttl_hours: u32,
    /// Mark the cookie `Secure` (HTTPS only)
    #[serde(default)]
    pub secure_cookie: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// OpenTelemetry export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// OTLP/HTTP collector endpoint, export is disabled when unset
    pub otlp_endpoint: Option<String>,
    /// Service name reported to the collector
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    5001
}

fn default_request_timeout() -> u32 {
    30
}

fn default_max_body_kb() -> u32 {
    64
}

fn default_assets_dir() -> String {
    "assets".to_string()
}

fn default_provider_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_provider_timeout() -> u32 {
    10
}

fn default_provider_max_retries() -> u32 {
    3
}

fn default_provider_language() -> String {
    "en".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_forecast_cache_minutes() -> u32 {
    10
}

fn default_cookie_name() -> String {
    "weatherdash_session".to_string()
}

fn default_session_ttl() -> u32 {
    24
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_service_name() -> String {
    "weatherdash".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            tls_cert_path: None,
            tls_key_path: None,
            request_timeout_seconds: default_request_timeout(),
            max_body_kb: default_max_body_kb(),
            assets_dir: default_assets_dir(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_provider_base_url(),
            timeout_seconds: default_provider_timeout(),
            max_retries: default_provider_max_retries(),
            language: default_provider_language(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            forecast_cache_minutes: default_forecast_cache_minutes(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_hours: default_session_ttl(),
            secure_cookie: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: default_service_name(),
        }
    }
}

impl WeatherDashConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
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

        // Environment overrides, e.g. WEATHERDASH_PROVIDER__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("WEATHERDASH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherDashConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherdash").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.server.max_body_kb == 0 {
            self.server.max_body_kb = default_max_body_kb();
        }
        if self.provider.base_url.is_empty() {
            self.provider.base_url = default_provider_base_url();
        }
        if self.provider.timeout_seconds == 0 {
            self.provider.timeout_seconds = default_provider_timeout();
        }
        if self.provider.language.is_empty() {
            self.provider.language = default_provider_language();
        }
        if self.storage.data_dir.is_empty() {
            self.storage.data_dir = default_data_dir();
        }
        if self.session.cookie_name.is_empty() {
            self.session.cookie_name = default_cookie_name();
        }
        if self.session.ttl_hours == 0 {
            self.session.ttl_hours = default_session_ttl();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.telemetry.service_name.is_empty() {
            self.telemetry.service_name = default_service_name();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// The provider API key, required before the server can fetch weather
    pub fn provider_api_key(&self) -> Result<&str> {
        self.provider.api_key.as_deref().ok_or_else(|| {
            WeatherDashError::config(
                "Missing provider API key. Set provider.api_key or WEATHERDASH_PROVIDER__API_KEY.",
            )
            .into()
        })
    }

    /// TLS certificate and key paths when HTTPS is configured
    #[must_use]
    pub fn tls_paths(&self) -> Option<(&str, &str)> {
        match (&self.server.tls_cert_path, &self.server.tls_key_path) {
            (Some(cert), Some(key)) => Some((cert.as_str(), key.as_str())),
            _ => None,
        }
    }

    fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.provider.api_key {
            if api_key.is_empty() {
                return Err(WeatherDashError::config(
                    "Provider API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(WeatherDashError::config(
                    "Provider API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 100 {
                return Err(WeatherDashError::config(
                    "Provider API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(WeatherDashError::config("Server port cannot be 0").into());
        }

        if self.server.request_timeout_seconds > 300 {
            return Err(
                WeatherDashError::config("Request timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.provider.timeout_seconds > 300 {
            return Err(
                WeatherDashError::config("Provider timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.provider.max_retries > 10 {
            return Err(WeatherDashError::config("Provider max retries cannot exceed 10").into());
        }

        if self.storage.forecast_cache_minutes > 1440 {
            return Err(WeatherDashError::config(
                "Forecast cache duration cannot exceed 1440 minutes (1 day)",
            )
            .into());
        }

        if self.session.ttl_hours > 720 {
            return Err(
                WeatherDashError::config("Session TTL cannot exceed 720 hours (30 days)").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherDashError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherDashError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(WeatherDashError::config(
                "Provider base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(WeatherDashError::config(
                "TLS requires both server.tls_cert_path and server.tls_key_path",
            )
            .into());
        }

        Ok(())
    }
}
