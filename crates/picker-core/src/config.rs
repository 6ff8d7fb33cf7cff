//! Gateway configuration
//!
//! All durations are carried as milliseconds so the structs map one-to-one
//! onto TOML and `PICKER_FETCHER__*` environment overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

/// Resilience settings for one protected upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Concurrent in-flight transport attempts (clamped to >= 1)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Minimum spacing between dispatch starts, 0 disables spacing
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Additional attempts beyond the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial retry delay
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    /// Retry delay ceiling (clamped to >= base_backoff_ms)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Consecutive rate-limit responses before the breaker opens, 0 disables
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,
    /// Cooldown once the breaker opens
    #[serde(default = "default_breaker_cooldown_ms")]
    pub breaker_cooldown_ms: u64,
    /// Response cache lifetime, 0 disables caching
    #[serde(default)]
    pub cache_ttl_ms: u64,
    /// Publish every retry delay as a breaker cooldown so all callers pause
    #[serde(default)]
    pub shared_backoff: bool,
}

fn default_max_concurrency() -> usize {
    1
}

fn default_min_interval_ms() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_backoff_ms() -> u64 {
    30_000
}

fn default_max_backoff_ms() -> u64 {
    180_000
}

fn default_breaker_threshold() -> u32 {
    3
}

fn default_breaker_cooldown_ms() -> u64 {
    120_000
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            min_interval_ms: default_min_interval_ms(),
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            breaker_threshold: default_breaker_threshold(),
            breaker_cooldown_ms: default_breaker_cooldown_ms(),
            cache_ttl_ms: 0,
            shared_backoff: false,
        }
    }
}

impl FetcherConfig {
    /// Create a configuration with the default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single attempt, no spacing, no breaker, no cache.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            max_concurrency: 1,
            min_interval_ms: 0,
            max_retries: 0,
            base_backoff_ms: 0,
            max_backoff_ms: 0,
            breaker_threshold: 0,
            breaker_cooldown_ms: 0,
            cache_ttl_ms: 0,
            shared_backoff: false,
        }
    }

    /// Set maximum concurrency
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Set minimum dispatch interval
    #[must_use]
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval_ms = duration_ms(interval);
        self
    }

    /// Set maximum retries
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set base and maximum backoff
    #[must_use]
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff_ms = duration_ms(base);
        self.max_backoff_ms = duration_ms(max);
        self
    }

    /// Set breaker threshold and cooldown
    #[must_use]
    pub fn with_breaker(mut self, threshold: u32, cooldown: Duration) -> Self {
        self.breaker_threshold = threshold;
        self.breaker_cooldown_ms = duration_ms(cooldown);
        self
    }

    /// Set response cache lifetime
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = duration_ms(ttl);
        self
    }

    /// Enable or disable shared backoff
    #[must_use]
    pub fn with_shared_backoff(mut self, shared: bool) -> Self {
        self.shared_backoff = shared;
        self
    }

    /// Apply the documented clamps, logging each adjustment.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.max_concurrency == 0 {
            warn!("fetcher.max_concurrency is 0, clamping to 1");
            self.max_concurrency = 1;
        }
        if self.max_backoff_ms < self.base_backoff_ms {
            warn!(
                base_backoff_ms = self.base_backoff_ms,
                max_backoff_ms = self.max_backoff_ms,
                "fetcher.max_backoff_ms below base, raising to base"
            );
            self.max_backoff_ms = self.base_backoff_ms;
        }
        self
    }

    /// Minimum dispatch interval
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Initial retry delay
    #[must_use]
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    /// Retry delay ceiling
    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Breaker cooldown
    #[must_use]
    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_millis(self.breaker_cooldown_ms)
    }

    /// Response cache lifetime
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Total transport attempts allowed per call
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Settings for the default HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Headers added to every request unless the descriptor overrides them
    #[serde(default = "default_headers")]
    pub default_headers: BTreeMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("picker/{}", env!("CARGO_PKG_VERSION"))
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "accept".to_string(),
        "application/json, text/plain, */*".to_string(),
    )])
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            default_headers: default_headers(),
        }
    }
}

impl HttpConfig {
    /// Per-attempt timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
