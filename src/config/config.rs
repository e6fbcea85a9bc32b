use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
    pub vendors: VendorsConfig,
}

/// Backing store of the id issuer. The store is provisioned separately;
/// the issuer only ever inserts into `table`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub table: String,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "watchlist.sqlite".to_string(),
            table: "object".to_string(),
            timeout_ms: 5000,
            max_attempts: 3,
            retry_delay_ms: 100,
        }
    }
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// CSV listing `url,base_url,path[,content_type]`.
    pub manifest: String,
    pub output: String,
    pub max_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            manifest: "pages.csv".to_string(),
            output: "results.csv".to_string(),
            max_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VendorsConfig {
    pub enabled: Vec<String>,
}

impl Default for VendorsConfig {
    fn default() -> Self {
        Self {
            enabled: crate::vendors::BUILTIN.iter().map(|name| name.to_string()).collect(),
        }
    }
}

/// Loads settings from an optional TOML file, overridden by
/// `WATCHLIST__SECTION__KEY` environment variables.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let settings = Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix("WATCHLIST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("vendors.enabled"),
        )
        .build()?;

    settings.try_deserialize::<AppConfig>()
}
