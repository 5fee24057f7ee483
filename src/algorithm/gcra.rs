//! GCRA (Generic Cell Rate Algorithm) rate limiting.
//!
//! Tracks a single fractional TAT ("theoretical arrival time") per key
//! instead of a counter or a set of timestamps — the cheapest possible
//! representation of a smooth rate limit.

use std::sync::Arc;

use crate::algorithm::{validate_params, RateLimiter};
use crate::decision::DecisionRecord;
use crate::error::Result;
use crate::script::executor::AtomicExecutor;
use crate::script::{GCRA_ATTEMPT, GCRA_INSPECT};

/// GCRA limiter. Cheap to clone: it holds only a shared executor handle.
#[derive(Clone)]
pub struct GCRA {
    executor: Arc<AtomicExecutor>,
}

impl GCRA {
    pub(crate) fn new(executor: Arc<AtomicExecutor>) -> Self {
        Self { executor }
    }

    /// `(limit, separation)` derived from `(rate, window)`: `limit =
    /// floor(rate * window)`, `separation = window / limit`.
    fn limit_and_separation(rate: f64, window: u64) -> (u64, f64) {
        let limit = (rate * window as f64).floor().max(1.0) as u64;
        let separation = window as f64 / limit as f64;
        (limit, separation)
    }

    fn full_key(&self, key: &str) -> String {
        self.executor.store().full_key("gcra", key)
    }

    fn ttl(period: u64, separation: f64) -> u64 {
        ((period as f64 * 2.0).ceil().max(separation.ceil())) as u64
    }
}

impl RateLimiter for GCRA {
    fn algorithm_name(&self) -> &'static str {
        "gcra"
    }

    async fn attempt(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<DecisionRecord> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let (limit, separation) = Self::limit_and_separation(rate, window);
        let ttl = Self::ttl(window, separation);

        let (allowed, retries_left, retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &GCRA_ATTEMPT,
                &[&full_key],
                &[
                    window.to_string(),
                    limit.to_string(),
                    separation.to_string(),
                    ttl.to_string(),
                ],
            )
            .await?;

        let retry_after = if allowed == 1 { 0 } else { retry_after };
        Ok(DecisionRecord::new(retry_after, retries_left, limit))
    }

    async fn attempts(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let (limit, separation) = Self::limit_and_separation(rate, window);

        let (attempts, _retries_left, _retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &GCRA_INSPECT,
                &[&full_key],
                &[window.to_string(), limit.to_string(), separation.to_string()],
            )
            .await?;

        Ok(attempts)
    }

    async fn remaining(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let (limit, separation) = Self::limit_and_separation(rate, window);

        let (_attempts, retries_left, _retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &GCRA_INSPECT,
                &[&full_key],
                &[window.to_string(), limit.to_string(), separation.to_string()],
            )
            .await?;

        Ok(retries_left)
    }

    async fn available_in(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let (limit, separation) = Self::limit_and_separation(rate, window);

        let (_attempts, _retries_left, retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &GCRA_INSPECT,
                &[&full_key],
                &[window.to_string(), limit.to_string(), separation.to_string()],
            )
            .await?;

        Ok(retry_after)
    }

    async fn reset(&self, key: &str) -> Result<u64> {
        self.executor.store().delete(&self.full_key(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_and_separation_derive_from_rate_and_window() {
        let (limit, separation) = GCRA::limit_and_separation(10.0, 1);
        assert_eq!(limit, 10);
        assert!((separation - 0.1).abs() < 1e-9);
    }

    #[test]
    fn limit_never_drops_below_one() {
        let (limit, _) = GCRA::limit_and_separation(0.001, 1);
        assert_eq!(limit, 1);
    }
}
