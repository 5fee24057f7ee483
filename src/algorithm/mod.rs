//! Rate limiting algorithm trait and implementations.
//!
//! Every algorithm exposes the same five operations with the same
//! signatures; they differ only in what `burst`, `rate`, and `window`
//! mean to the underlying script. `attempt` is the only mutating call —
//! everything else is best-effort observation.

mod fixed_window;
mod gcra;
mod leaky_bucket;
mod sliding_window;
mod token_bucket;

pub use fixed_window::FixedWindow;
pub use gcra::GCRA;
pub use leaky_bucket::LeakyBucket;
pub use sliding_window::SlidingWindow;
pub use token_bucket::TokenBucket;

use std::future::Future;

use crate::decision::DecisionRecord;
use crate::error::{ConfigError, Result};

/// Common admission contract shared by all five algorithms.
///
/// Implementations are thin wrappers around the script catalogue: all
/// state lives in the store, so a `RateLimiter` holds nothing but an
/// `AtomicExecutor` handle and is cheap to clone and share across tasks.
pub trait RateLimiter: Send + Sync + 'static {
    /// Algorithm name, used for logging and key prefixing.
    fn algorithm_name(&self) -> &'static str;

    /// The only mutating call: attempt an admission for `key`.
    fn attempt(
        &self,
        key: &str,
        burst: u64,
        rate: f64,
        window: u64,
    ) -> impl Future<Output = Result<DecisionRecord>> + Send;

    /// Best-effort current usage, without mutating state.
    fn attempts(
        &self,
        key: &str,
        burst: u64,
        rate: f64,
        window: u64,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Admissions still available right now, without mutating state.
    fn remaining(
        &self,
        key: &str,
        burst: u64,
        rate: f64,
        window: u64,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Seconds until the next admission would succeed.
    fn available_in(
        &self,
        key: &str,
        burst: u64,
        rate: f64,
        window: u64,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Delete all state for a key. Returns the number of entries removed.
    fn reset(&self, key: &str) -> impl Future<Output = Result<u64>> + Send;
}

/// Validate the caller-supplied admission parameters before touching the
/// store: argument-domain errors are surfaced synchronously, with no
/// state touched.
pub(crate) fn validate_params(burst: u64, rate: f64, window: u64) -> Result<()> {
    if burst == 0 {
        return Err(ConfigError::InvalidBurst(burst).into());
    }
    if !(rate > 0.0) || !rate.is_finite() {
        return Err(ConfigError::InvalidRate(rate).into());
    }
    if window == 0 {
        return Err(ConfigError::InvalidWindow(window).into());
    }
    Ok(())
}
