use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Root application configuration. Loaded from environment variables
/// with the prefix `PLUGIN_MARKETPLACE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub latency: LatencyConfig,
    /// Extra workspace-id to company-name entries, merged over the built-in directory.
    #[serde(default)]
    pub companies: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: Option<u64>,
    #[serde(default = "default_plugins_key")]
    pub plugins_key: String,
    #[serde(default = "default_installations_key")]
    pub installations_key: String,
}

/// Artificial delays emulating a network round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LatencyConfig {
    #[serde(default = "default_read_delay_ms")]
    pub read_delay_ms: u64,
    #[serde(default = "default_write_delay_ms")]
    pub write_delay_ms: u64,
    #[serde(default = "default_submit_delay_ms")]
    pub submit_delay_ms: u64,
}

impl LatencyConfig {
    pub fn none() -> Self {
        Self {
            read_delay_ms: 0,
            write_delay_ms: 0,
            submit_delay_ms: 0,
        }
    }

    pub fn read(&self) -> Duration {
        Duration::from_millis(self.read_delay_ms)
    }

    pub fn write(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }

    pub fn submit(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

// Default functions
fn default_data_dir() -> String {
    "./data".to_string()
}
fn default_quota_bytes() -> Option<u64> {
    // Browsers cap local storage at roughly 5 MiB per origin.
    Some(5 * 1024 * 1024)
}
fn default_plugins_key() -> String {
    "submittedPlugins".to_string()
}
fn default_installations_key() -> String {
    "pluginInstallations".to_string()
}
fn default_read_delay_ms() -> u64 {
    100
}
fn default_write_delay_ms() -> u64 {
    100
}
fn default_submit_delay_ms() -> u64 {
    500
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
            quota_bytes: default_quota_bytes(),
            plugins_key: default_plugins_key(),
            installations_key: default_installations_key(),
        }
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            read_delay_ms: default_read_delay_ms(),
            write_delay_ms: default_write_delay_ms(),
            submit_delay_ms: default_submit_delay_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            latency: LatencyConfig::default(),
            companies: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("PLUGIN_MARKETPLACE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
