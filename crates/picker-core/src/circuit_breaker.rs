//! Rate-limit circuit breaker
//!
//! Counts consecutive rate-limited responses from one upstream. Once the
//! count reaches the threshold, every caller pauses until a shared cooldown
//! deadline passes. There is no half-open probe: the circuit is open exactly
//! while `now < cooldown_until`, and closes by time alone.
//! - Closed: requests pass through
//! - Open: callers wait out the cooldown before their next attempt

use crate::config::duration_ms;
use crate::error::{Error, Result};
use crate::outcome::Outcome;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// No cooldown pending
    Closed,
    /// Cooldown deadline in the future
    Open,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
        }
    }
}

/// Configuration for circuit breaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive rate-limit signals before opening, 0 disables breaking
    pub threshold: u32,
    /// How long the circuit stays open
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            cooldown: Duration::from_secs(120),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set threshold
    #[must_use]
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set cooldown
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

/// Mutable breaker state, shared by every caller of one upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakerState {
    /// Rate-limited outcomes seen in a row
    pub consecutive_rate_limits: u32,
    /// Deadline before which callers must wait; only ever moves forward
    pub cooldown_until: Option<Instant>,
}

impl BreakerState {
    fn merge_cooldown(&mut self, until: Instant) -> bool {
        match self.cooldown_until {
            Some(current) if current >= until => false,
            _ => {
                self.cooldown_until = Some(until);
                true
            }
        }
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.cooldown_until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}

/// Circuit breaker keyed on rate-limit signals
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, CircuitBreakerConfig::default())
    }

    /// Get the circuit breaker name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the shared state
    #[must_use]
    pub fn snapshot(&self) -> BreakerState {
        *self.lock()
    }

    /// Get the current state
    #[must_use]
    pub fn state(&self) -> CircuitState {
        if self.remaining_cooldown().is_zero() {
            CircuitState::Closed
        } else {
            CircuitState::Open
        }
    }

    /// Current consecutive rate-limit count
    #[must_use]
    pub fn consecutive_rate_limits(&self) -> u32 {
        self.lock().consecutive_rate_limits
    }

    /// Time left before the circuit closes
    #[must_use]
    pub fn remaining_cooldown(&self) -> Duration {
        self.lock().remaining(Instant::now())
    }

    /// Feed one classified attempt into the breaker.
    ///
    /// Rate-limited outcomes advance the streak and may open the circuit;
    /// anything else resets the streak without touching the cooldown.
    pub fn record(&self, outcome: &Outcome) {
        if outcome.is_rate_limited() {
            self.record_rate_limited();
        } else {
            self.record_other();
        }
    }

    /// Record a rate-limited attempt
    pub fn record_rate_limited(&self) {
        let mut state = self.lock();
        state.consecutive_rate_limits = state.consecutive_rate_limits.saturating_add(1);
        let streak = state.consecutive_rate_limits;

        debug!(
            name = %self.name,
            streak = streak,
            threshold = self.config.threshold,
            "Rate limit recorded"
        );

        if self.config.threshold > 0 && streak >= self.config.threshold {
            let until = Instant::now() + self.config.cooldown;
            if state.merge_cooldown(until) {
                info!(
                    name = %self.name,
                    streak = streak,
                    cooldown_ms = duration_ms(self.config.cooldown),
                    "Circuit breaker opened"
                );
            }
        }
    }

    /// Record any attempt that was not rate limited
    pub fn record_other(&self) {
        self.lock().consecutive_rate_limits = 0;
    }

    /// Push the cooldown deadline to at least `now + delay`.
    ///
    /// Concurrent extensions merge by maximum, so a shorter proposal never
    /// shortens a longer pending cooldown.
    pub fn extend_cooldown(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        let until = Instant::now() + delay;
        self.lock().merge_cooldown(until);
    }

    /// Wait until the circuit is closed.
    ///
    /// Re-checks after each wake, since another caller may have extended the
    /// cooldown meanwhile.
    pub async fn wait_until_closed(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            let Some(until) = self.pending_deadline() else {
                return Ok(());
            };
            debug!(
                name = %self.name,
                wait_ms = duration_ms(until.saturating_duration_since(Instant::now())),
                "Waiting for circuit breaker cooldown"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                () = sleep_until(until) => {}
            }
        }
    }

    /// Reset the circuit breaker to closed state
    pub fn reset(&self) {
        let mut state = self.lock();
        if state.cooldown_until.is_some() || state.consecutive_rate_limits > 0 {
            info!(name = %self.name, "Circuit breaker reset");
        }
        *state = BreakerState::default();
    }

    fn pending_deadline(&self) -> Option<Instant> {
        let now = Instant::now();
        self.lock().cooldown_until.filter(|until| *until > now)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
