//! Picker Core - Resilient Outbound Gateway
//!
//! Every call to a rate-limited upstream goes through a [`ResilientFetcher`],
//! which combines:
//! - Gate: bounded concurrency and minimum spacing between dispatches
//! - Breaker: shared cooldown after repeated rate-limit responses
//! - Backoff: exponential retry delays, overridden by `Retry-After`
//! - Cache: optional TTL cache for successful responses
//!
//! The network sits behind the [`Transport`] trait; [`HttpTransport`] is the
//! `reqwest` implementation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backoff;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod gate;
pub mod outcome;
pub mod transport;

pub use backoff::{compute_delay, parse_retry_after, BackoffPolicy, RATE_LIMIT_MIN_DELAY};
pub use cache::{CacheEntry, TtlCache};
pub use circuit_breaker::{BreakerState, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::{FetcherConfig, HttpConfig};
pub use error::{Error, Result, TransportError};
pub use fetcher::ResilientFetcher;
pub use gate::{GatePermit, RateLimitedGate};
pub use outcome::{classify_response, Method, Outcome, RawResponse, RequestDescriptor};
pub use transport::{HttpTransport, Transport};
