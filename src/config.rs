//! Configuration file handling with TOML support.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Service connection settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-operation request deadlines
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Push registration defaults
    #[serde(default)]
    pub push: PushConfig,

    /// Override for the token cache location
    #[serde(default)]
    pub token_path: Option<PathBuf>,
}

/// Where and how to reach the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the alerting service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Static API key sent on every request for backward compatibility
    #[serde(default)]
    pub api_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Request deadlines in seconds. The endpoints have very different latency
/// envelopes: health is a ping, the job trigger runs the whole evaluator,
/// and image analysis runs an AI model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_health_timeout")]
    pub health: u64,

    #[serde(default = "default_request_timeout")]
    pub default: u64,

    #[serde(default = "default_jobs_timeout")]
    pub jobs: u64,

    #[serde(default = "default_image_timeout")]
    pub image: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            health: default_health_timeout(),
            default: default_request_timeout(),
            jobs: default_jobs_timeout(),
            image: default_image_timeout(),
        }
    }
}

fn default_health_timeout() -> u64 {
    5
}
fn default_request_timeout() -> u64 {
    8
}
fn default_jobs_timeout() -> u64 {
    20
}
fn default_image_timeout() -> u64 {
    60
}

/// Defaults for push-token registration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PushConfig {
    /// Stable device identifier; the service keeps one token per device
    #[serde(default)]
    pub device_id: Option<String>,
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from default location or fall back to defaults.
    pub fn load_or_default() -> Self {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                match Self::load(&path) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to load config: {}", e);
                    }
                }
            }
        }
        Config::default()
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pricewatch").join("config.toml"))
    }

    /// Save configuration to file.
    pub fn save(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

/// Generate a sample configuration file content.
pub fn sample_config() -> &'static str {
    r##"# Pricewatch Configuration File
# Command-line client for the pricewatch alerting service

[server]
# Base URL of the service
base_url = "http://localhost:8000"
# Static API key sent with every request
api_key = ""

[timeouts]
# Request deadlines in seconds
health = 5
default = 8
jobs = 20
image = 60

[push]
# Stable device identifier used when registering push tokens
# device_id = "my-laptop"
"##
}
