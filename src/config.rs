//! Configuration loader for the `greenhouse-telemetry` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Primary upstream GET endpoint (gas/climate sensor batches).
    pub sensor_api_url: String,

    /// Optional secondary upstream GET endpoint (soil sensors).
    pub soil_api_url: Option<String>,

    /// Background poll interval in seconds.
    pub poll_interval_secs: u32,

    /// HTTP timeout for upstream fetches, in seconds.
    pub fetch_timeout_secs: u32,

    /// Path of the persisted threshold override file.
    pub thresholds_path: String,

    /// TCP port the API listens on.
    pub bind_port: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `SENSOR_API_URL` – primary upstream GET endpoint
///
/// Optional:
/// - `SOIL_API_URL` – secondary soil-sensor GET endpoint (no default)
/// - `POLL_INTERVAL_SECS` – background poll interval (default: 3)
/// - `FETCH_TIMEOUT_SECS` – upstream HTTP timeout (default: 10)
/// - `THRESHOLDS_PATH` – threshold override file (default: thresholds.json)
/// - `BIND_PORT` – API listen port (default: 8080)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let sensor_api_url = require_env!("SENSOR_API_URL");
    let soil_api_url = env::var("SOIL_API_URL").ok().filter(|v| !v.is_empty());
    let poll_interval_secs = parse_env_u32!("POLL_INTERVAL_SECS", 3);
    let fetch_timeout_secs = parse_env_u32!("FETCH_TIMEOUT_SECS", 10);
    let thresholds_path =
        env::var("THRESHOLDS_PATH").unwrap_or_else(|_| "thresholds.json".to_string());
    let bind_port = parse_env_u32!("BIND_PORT", 8080);

    Ok(Config {
        sensor_api_url,
        soil_api_url,
        poll_interval_secs,
        fetch_timeout_secs,
        thresholds_path,
        bind_port,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  SENSOR_API_URL     : {}", self.sensor_api_url);
        tracing::info!(
            "  SOIL_API_URL       : {}",
            self.soil_api_url.as_deref().unwrap_or("(unset)")
        );
        tracing::info!("  POLL_INTERVAL_SECS : {}", self.poll_interval_secs);
        tracing::info!("  FETCH_TIMEOUT_SECS : {}", self.fetch_timeout_secs);
        tracing::info!("  THRESHOLDS_PATH    : {}", self.thresholds_path);
        tracing::info!("  BIND_PORT          : {}", self.bind_port);
    }
}
