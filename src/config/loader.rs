//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    build(
        // prefix_separator("_") so PICKER_FETCHER__MAX_RETRIES maps to
        // fetcher.max_retries; config-rs would otherwise expect PICKER__.
        Environment::with_prefix("PICKER")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}

fn build(environment: Environment) -> Result<AppConfig> {
    let profile = std::env::var("PICKER_ENV").unwrap_or_else(|_| "development".to_string());

    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{profile}")).required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority)
        .add_source(environment)
        .build()
        .context("Failed to build configuration")?;

    let app: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    Ok(AppConfig {
        fetcher: app.fetcher.sanitized(),
        http: app.http,
    })
}
