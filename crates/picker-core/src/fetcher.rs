//! Resilient fetcher
//!
//! Wraps single transport attempts with the gate, the rate-limit breaker,
//! exponential backoff and an optional response cache. One fetcher guards
//! one upstream; share it (e.g. behind an `Arc`) between every caller of
//! that upstream so they see the same slots and cooldown.

use crate::backoff::BackoffPolicy;
use crate::cache::TtlCache;
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::config::{duration_ms, FetcherConfig};
use crate::error::{Error, Result};
use crate::gate::RateLimitedGate;
use crate::outcome::{Outcome, RawResponse, RequestDescriptor};
use crate::transport::Transport;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Gate + breaker + backoff + cache around a [`Transport`].
#[derive(Debug)]
pub struct ResilientFetcher {
    config: FetcherConfig,
    gate: RateLimitedGate,
    breaker: CircuitBreaker,
    backoff: BackoffPolicy,
    cache: TtlCache<String, RawResponse>,
}

impl ResilientFetcher {
    /// Create a fetcher; the configuration is sanitized first.
    #[must_use]
    pub fn new(config: FetcherConfig) -> Self {
        Self::named("upstream", config)
    }

    /// Create a fetcher whose breaker logs under `name`
    #[must_use]
    pub fn named(name: impl Into<String>, config: FetcherConfig) -> Self {
        let config = config.sanitized();
        let breaker = CircuitBreaker::new(
            name,
            CircuitBreakerConfig::new()
                .with_threshold(config.breaker_threshold)
                .with_cooldown(config.breaker_cooldown()),
        );
        Self {
            gate: RateLimitedGate::new(config.max_concurrency, config.min_interval()),
            breaker,
            backoff: BackoffPolicy::new(config.base_backoff(), config.max_backoff()),
            cache: TtlCache::new(config.cache_ttl()),
            config,
        }
    }

    /// Single attempt, no spacing, breaker or cache
    #[must_use]
    pub fn minimal() -> Self {
        Self::new(FetcherConfig::minimal())
    }

    /// Effective configuration
    #[must_use]
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Concurrency gate
    #[must_use]
    pub fn gate(&self) -> &RateLimitedGate {
        &self.gate
    }

    /// Rate-limit breaker
    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Response cache, keyed by descriptor cache key
    #[must_use]
    pub fn cache(&self) -> &TtlCache<String, RawResponse> {
        &self.cache
    }

    /// Run one logical call to completion.
    ///
    /// Returns the final classified [`Outcome`]. Upstream failures are never
    /// errors; `Err` only means `cancel` fired while the call was suspended.
    #[instrument(skip_all, fields(url = %request.url()))]
    pub async fn execute<T>(
        &self,
        request: &RequestDescriptor,
        transport: &T,
        cancel: &CancellationToken,
    ) -> Result<Outcome>
    where
        T: Transport + ?Sized,
    {
        if let Some(key) = request.cache_key() {
            if let Some(cached) = self.cache.get(key) {
                debug!(cache_key = key, "Response cache hit");
                return Ok(Outcome::Success(cached));
            }
        }

        let max_attempts = self.config.max_attempts();
        let mut attempts: u32 = 0;

        loop {
            self.breaker.wait_until_closed(cancel).await?;

            let result = {
                let _permit = self.gate.acquire(cancel).await?;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    result = transport.send(request) => result,
                }
            };
            attempts += 1;

            let outcome = transport.classify(result);
            self.breaker.record(&outcome);

            if !outcome.is_retryable() {
                if let (Outcome::Success(response), Some(key)) = (&outcome, request.cache_key()) {
                    self.cache.put(key.to_string(), response.clone());
                }
                debug!(attempts = attempts, outcome = outcome.kind(), "Request finished");
                return Ok(outcome);
            }

            if attempts >= max_attempts {
                debug!(
                    attempts = attempts,
                    outcome = outcome.kind(),
                    "Retry budget exhausted"
                );
                return Ok(outcome);
            }

            let delay = self.backoff.delay_for(
                attempts - 1,
                outcome.retry_after(),
                outcome.is_rate_limited(),
            );

            if outcome.is_rate_limited() {
                warn!(
                    endpoint = %request.url(),
                    retry = attempts,
                    max_retries = self.config.max_retries,
                    wait_ms = duration_ms(delay),
                    has_hint = outcome.retry_after().is_some(),
                    "Rate limited, backing off"
                );
            } else {
                debug!(
                    retry = attempts,
                    outcome = outcome.kind(),
                    wait_ms = duration_ms(delay),
                    "Retrying after backoff"
                );
            }

            if self.config.shared_backoff {
                // The next breaker wait covers the delay for every caller
                self.breaker.extend_cooldown(delay);
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    /// [`execute`](Self::execute) bounded by an overall deadline.
    ///
    /// On expiry the in-progress wait or attempt is dropped, releasing any
    /// held slot, and [`Error::Timeout`] is returned.
    pub async fn execute_with_timeout<T>(
        &self,
        request: &RequestDescriptor,
        transport: &T,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<Outcome>
    where
        T: Transport + ?Sized,
    {
        tokio::time::timeout(timeout, self.execute(request, transport, cancel))
            .await
            .map_err(|_| Error::Timeout(duration_ms(timeout)))?
    }

    /// Execute and parse a successful body as JSON.
    ///
    /// Every outcome other than a success with a parseable body yields
    /// `None`.
    pub async fn fetch_json<T>(
        &self,
        request: &RequestDescriptor,
        transport: &T,
        cancel: &CancellationToken,
    ) -> Result<Option<serde_json::Value>>
    where
        T: Transport + ?Sized,
    {
        let outcome = self.execute(request, transport, cancel).await?;
        let Some(response) = outcome.into_response() else {
            return Ok(None);
        };
        match serde_json::from_str(&response.body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!(url = %request.url(), error = %e, "Response body is not JSON");
                Ok(None)
            }
        }
    }
}
