#[allow(clippy::module_inception)]
mod config;

pub use self::config::{load_config, AppConfig, BatchConfig, DatabaseConfig, LoggingConfig, VendorsConfig};
