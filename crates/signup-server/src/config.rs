//! Configuration for the signup service.

use anyhow::{bail, Context, Result};
use backend_client::BackendConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Identity, storage and database backend
    pub backend: BackendConfig,

    /// Camera configuration
    #[serde(default)]
    pub camera: CameraConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// File the camera driver writes its latest frame to
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Where the UI should navigate after signup or login
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            landing_path: default_landing_path(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_source_path() -> PathBuf {
    PathBuf::from("/dev/shm/camera-frame.png")
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_landing_path() -> String {
    "/Usersurface".into()
}

fn default_global_rpm() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_environment(config::Environment::default())
    }

    /// Load configuration from an explicit set of variables.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_environment(config::Environment::default().source(Some(vars)))
    }

    fn from_environment(environment: config::Environment) -> Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(environment.separator("__").try_parsing(false))
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject empty required backend settings.
    pub fn validate(&self) -> Result<()> {
        let missing = self.backend.missing_fields();
        if !missing.is_empty() {
            bail!(
                "Missing required backend settings: {}",
                missing
                    .iter()
                    .map(|f| format!("BACKEND__{}", f.to_uppercase()))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Ok(())
    }
}
