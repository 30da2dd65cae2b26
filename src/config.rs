//! Configuration management for the route enricher
//!
//! Handles loading configuration from an optional TOML file and environment
//! variables, and validates the result before the server starts.

use crate::EnricherError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "ENRICHER_CONFIG";
/// Port assigned by the Functions host to a custom handler
pub const CUSTOM_HANDLER_PORT_ENV: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnricherConfig {
    /// Inbound HTTP settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Weather API settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Distance matrix API settings
    #[serde(default)]
    pub maps: MapsConfig,
    /// Batch processing settings
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Inbound HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Function name, served under `/api/<route>`
    #[serde(default = "default_route")]
    pub route: String,
    /// Shared key required per request; open access when unset
    #[serde(default)]
    pub function_key: Option<String>,
    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Distance matrix API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    /// Base URL for the maps API
    #[serde(default = "default_maps_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Routes looked up at the same time. 1 keeps the batch strictly sequential.
    #[serde(default = "default_max_concurrent_routes")]
    pub max_concurrent_routes: usize,
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

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7071
}

fn default_route() -> String {
    "WeatherTrafficFunction".to_string()
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_weather_base_url() -> String {
    "https://api.weatherapi.com/v1".to_string()
}

fn default_maps_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_max_concurrent_routes() -> usize {
    1
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
            route: default_route(),
            function_key: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            base_url: default_maps_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_routes: default_max_concurrent_routes(),
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

impl EnricherConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| PathBuf::from("config.toml"));

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // ENRICHER_SERVER__PORT=8080 overrides server.port
        builder = builder.add_source(
            Environment::with_prefix("ENRICHER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: EnricherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if let Ok(port) = std::env::var(CUSTOM_HANDLER_PORT_ENV) {
            config.server.port = port
                .parse()
                .with_context(|| format!("Invalid {CUSTOM_HANDLER_PORT_ENV}: {port}"))?;
        }

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.route.is_empty() {
            self.server.route = default_route();
        }
        if self.server.max_body_bytes == 0 {
            self.server.max_body_bytes = default_max_body_bytes();
        }
        if self
            .server
            .function_key
            .as_deref()
            .is_some_and(str::is_empty)
        {
            self.server.function_key = None;
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.maps.base_url.is_empty() {
            self.maps.base_url = default_maps_base_url();
        }
        if self.maps.timeout_seconds == 0 {
            self.maps.timeout_seconds = default_timeout();
        }
        if self.enrichment.max_concurrent_routes == 0 {
            self.enrichment.max_concurrent_routes = default_max_concurrent_routes();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                EnricherError::config("Weather API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.maps.timeout_seconds > 300 {
            return Err(
                EnricherError::config("Maps API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.enrichment.max_concurrent_routes > 64 {
            return Err(
                EnricherError::config("Concurrent route lookups cannot exceed 64").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(EnricherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(EnricherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Weather", &self.weather.base_url),
            ("Maps", &self.maps.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(EnricherError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.server.route.contains('/') {
            return Err(EnricherError::config(format!(
                "Function route '{}' must be a single path segment",
                self.server.route
            ))
            .into());
        }

        Ok(())
    }
}
