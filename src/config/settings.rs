use std::path::PathBuf;

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::cluster::ClusterMetadata;

/// Hierarchical settings: hardcoded defaults, then `config/default.toml`,
/// then `config/local.toml`, then `BOT_*` environment variables. All
/// environment-derived provider inputs are collected here once, at startup;
/// nothing below this layer reads the environment.
#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub pool: PoolSettings,
    pub cluster: ClusterMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// XML-RPC endpoint of the cloud provider.
    pub endpoint: String,
    /// Auth token file; its first line is the provider session string.
    pub auth_file: PathBuf,
    /// Hex-encoded user-data payload embedded into every node template.
    pub user_data_file: PathBuf,
    /// Observed but not applied to the coordinator address (see the
    /// provisioner). Kept so the operator can see both values in the logs.
    pub public_ip_override: Option<String>,
    /// Per-RPC timeout; a timed-out allocation counts as a plain failure.
    pub request_timeout_secs: u64,
    /// URL workers mount to fetch task input files.
    pub files_location_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoolSettings {
    /// HTTP surface of the communication pool's membership registry.
    pub registry_url: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());

        info!("Loading configuration from path: {}", config_path);

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.api_prefix", "/api/v1")?
            .set_default("provider.request_timeout_secs", 30)?
            .add_source(File::with_name(&format!("{}/default", config_path)))
            .add_source(File::with_name(&format!("{}/local", config_path)).required(false))
            .add_source(config::Environment::with_prefix("BOT").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
