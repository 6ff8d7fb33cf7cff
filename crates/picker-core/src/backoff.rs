//! Retry delay computation
//!
//! Exponential backoff capped at a ceiling, overridden by an upstream
//! `Retry-After` hint when one parses.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Floor applied to every delay after a rate-limited response
pub const RATE_LIMIT_MIN_DELAY: Duration = Duration::from_millis(1000);

/// Base and ceiling for retry delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub base: Duration,
    /// Upper bound for any delay
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(30),
            max: Duration::from_secs(180),
        }
    }
}

impl BackoffPolicy {
    /// Create a policy, raising `max` to `base` if it is lower
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
        }
    }

    /// Delay before retry number `attempt` (0-based).
    ///
    /// `rate_limited` applies the [`RATE_LIMIT_MIN_DELAY`] floor.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, retry_after: Option<&str>, rate_limited: bool) -> Duration {
        let delay = compute_delay(attempt, retry_after, self.base, self.max);
        if rate_limited {
            delay.max(RATE_LIMIT_MIN_DELAY)
        } else {
            delay
        }
    }
}

/// Delay for `attempt` (0-based) given an optional `Retry-After` value.
///
/// A parseable hint wins, capped at `max`. Otherwise `base * 2^attempt`,
/// saturating, capped at `max`.
#[must_use]
pub fn compute_delay(
    attempt: u32,
    retry_after: Option<&str>,
    base: Duration,
    max: Duration,
) -> Duration {
    if let Some(hint) = retry_after.and_then(parse_retry_after) {
        return hint.min(max);
    }
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(max)
}

/// Parse a `Retry-After` header value.
///
/// Accepts delay-seconds (fractions allowed) or an HTTP-date. A date in the
/// past means "retry now" and yields zero.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    parse_retry_after_at(value, Utc::now())
}

fn parse_retry_after_at(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(secs) = value.parse::<f64>() {
        if secs.is_finite() && secs >= 0.0 {
            return Duration::try_from_secs_f64(secs).ok();
        }
        return None;
    }
    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let remaining = date.with_timezone(&Utc) - now;
    Some(remaining.to_std().unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests;
