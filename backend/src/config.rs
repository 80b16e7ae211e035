//! Configuration management for the PM2.5 dashboard server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PM25_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Upstream prediction service
    pub prediction: PredictionConfig,

    /// Dashboard behaviour
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PredictionConfig {
    /// Base URL of the prediction API, without the `/api/v2` path
    pub base_url: String,

    /// Request timeout; a full-city prediction fans out to every district
    pub timeout_seconds: u64,

    /// Weather API key forwarded to the prediction service
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Offset of the city's wall clock from UTC (Asia/Ho_Chi_Minh is +7, no DST)
    pub utc_offset_hours: i32,

    /// Default length of the ranking list
    pub ranking_limit: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("PM25_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("prediction.base_url", "http://localhost:5000")?
            .set_default("prediction.timeout_seconds", 60)?
            .set_default("dashboard.utc_offset_hours", 7)?
            .set_default("dashboard.ranking_limit", 10)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PM25_ prefix)
            .add_source(
                Environment::with_prefix("PM25")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_seconds: 60,
            api_key: None,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 7,
            ranking_limit: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_files() {
        let config = Config::load().unwrap();
        assert!(config.server.port > 0);
        assert!(!config.prediction.base_url.is_empty());
        assert!(config.dashboard.ranking_limit > 0);
    }
}
