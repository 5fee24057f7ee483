//! Sliding window rate limiting.
//!
//! State is an ordered set of admitted timestamps; the cap is always
//! `floor(rate * window)`, i.e. `burst` is ignored — the algorithm is
//! smooth by construction rather than bursty, so a separate burst
//! parameter would have no meaning here.

use std::sync::Arc;

use crate::algorithm::{validate_params, RateLimiter};
use crate::decision::DecisionRecord;
use crate::error::Result;
use crate::script::executor::AtomicExecutor;
use crate::script::{SLIDING_WINDOW_ATTEMPT, SLIDING_WINDOW_INSPECT};

/// Sliding window limiter. Cheap to clone: it holds only a shared
/// executor handle.
#[derive(Clone)]
pub struct SlidingWindow {
    executor: Arc<AtomicExecutor>,
}

impl SlidingWindow {
    pub(crate) fn new(executor: Arc<AtomicExecutor>) -> Self {
        Self { executor }
    }

    fn max_requests(rate: f64, window: u64) -> u64 {
        (rate * window as f64).floor().max(0.0) as u64
    }

    fn full_key(&self, key: &str) -> String {
        self.executor.store().full_key("sliding", key)
    }
}

impl RateLimiter for SlidingWindow {
    fn algorithm_name(&self) -> &'static str {
        "sliding"
    }

    async fn attempt(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<DecisionRecord> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let max_requests = Self::max_requests(rate, window);

        let (allowed, remaining, retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &SLIDING_WINDOW_ATTEMPT,
                &[&full_key],
                &[window.to_string(), max_requests.to_string()],
            )
            .await?;

        let retry_after = if allowed == 1 { 0 } else { retry_after };
        Ok(DecisionRecord::new(retry_after, remaining, max_requests))
    }

    async fn attempts(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let max_requests = Self::max_requests(rate, window);

        let (attempts, _remaining, _retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &SLIDING_WINDOW_INSPECT,
                &[&full_key],
                &[window.to_string(), max_requests.to_string()],
            )
            .await?;

        Ok(attempts)
    }

    async fn remaining(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let max_requests = Self::max_requests(rate, window);

        let (_attempts, remaining, _retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &SLIDING_WINDOW_INSPECT,
                &[&full_key],
                &[window.to_string(), max_requests.to_string()],
            )
            .await?;

        Ok(remaining)
    }

    async fn available_in(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let max_requests = Self::max_requests(rate, window);

        let (_attempts, _remaining, retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &SLIDING_WINDOW_INSPECT,
                &[&full_key],
                &[window.to_string(), max_requests.to_string()],
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
    fn max_requests_floors_rate_times_window() {
        assert_eq!(SlidingWindow::max_requests(2.5, 10), 25);
        assert_eq!(SlidingWindow::max_requests(0.3, 10), 3);
    }
}
