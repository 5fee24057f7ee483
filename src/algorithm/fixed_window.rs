//! Fixed window rate limiting.
//!
//! State is an integer counter keyed by `(key, floor(now/window))`. The
//! cap renews instantaneously at the slot boundary, so two adjacent
//! slots may each admit the full cap back-to-back — this is the
//! documented trade-off of the algorithm, not a bug.
//!
//! `reset` cannot be a single atomic script here: the slot suffix is
//! derived from the store's own clock at read time, so a caller resetting
//! "the current slot" while a script is mutating "the next" slot would
//! race regardless of implementation. This implementation instead takes
//! a best-effort, non-atomic `SCAN`-then-`DEL` sweep over every sibling
//! slot key, documented as such.

use std::sync::Arc;

use crate::algorithm::{validate_params, RateLimiter};
use crate::decision::DecisionRecord;
use crate::error::Result;
use crate::script::executor::AtomicExecutor;
use crate::script::{FIXED_WINDOW_ATTEMPT, FIXED_WINDOW_INSPECT};

/// Fixed window limiter. Cheap to clone: it holds only a shared executor
/// handle.
#[derive(Clone)]
pub struct FixedWindow {
    executor: Arc<AtomicExecutor>,
}

impl FixedWindow {
    pub(crate) fn new(executor: Arc<AtomicExecutor>) -> Self {
        Self { executor }
    }

    fn key_prefix(&self, key: &str) -> String {
        self.executor.store().full_key("fixed", key)
    }
}

impl RateLimiter for FixedWindow {
    fn algorithm_name(&self) -> &'static str {
        "fixed"
    }

    async fn attempt(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<DecisionRecord> {
        validate_params(burst, rate, window)?;
        let key_prefix = self.key_prefix(key);

        let (allowed, remaining, retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &FIXED_WINDOW_ATTEMPT,
                &[&key_prefix],
                &[window.to_string(), burst.to_string()],
            )
            .await?;

        let retry_after = if allowed == 1 { 0 } else { retry_after };
        Ok(DecisionRecord::new(retry_after, remaining, burst))
    }

    async fn attempts(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let key_prefix = self.key_prefix(key);

        let (attempts, _remaining, _retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &FIXED_WINDOW_INSPECT,
                &[&key_prefix],
                &[window.to_string(), burst.to_string()],
            )
            .await?;

        Ok(attempts)
    }

    async fn remaining(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let key_prefix = self.key_prefix(key);

        let (_attempts, remaining, _retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &FIXED_WINDOW_INSPECT,
                &[&key_prefix],
                &[window.to_string(), burst.to_string()],
            )
            .await?;

        Ok(remaining)
    }

    async fn available_in(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let key_prefix = self.key_prefix(key);

        let (_attempts, _remaining, retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &FIXED_WINDOW_INSPECT,
                &[&key_prefix],
                &[window.to_string(), burst.to_string()],
            )
            .await?;

        Ok(retry_after)
    }

    /// Best-effort reset: sweeps every sibling slot key under this
    /// prefix. See the module doc comment for why this can't be a single
    /// atomic script.
    async fn reset(&self, key: &str) -> Result<u64> {
        let pattern = format!("{}:*", self.key_prefix(key));
        self.executor.store().scan_delete(&pattern).await
    }
}
