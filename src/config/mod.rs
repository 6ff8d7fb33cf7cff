//! Application configuration
//!
//! One fetcher section and one HTTP section, both defaulting to the values
//! embedded in `config/default.toml`.

mod loader;

pub use loader::load_config;

use picker_core::{FetcherConfig, HttpConfig};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub http: HttpConfig,
}
