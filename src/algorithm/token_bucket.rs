//! Token bucket rate limiting.
//!
//! State is `(tokens, last_refill, attempts)`. Refills use an anti-thrash
//! floor (`min_refill = max(1, 2/rate)`): without it, fast call rates
//! produce fractional-but-nonzero refills on every call, letting the
//! observed bucket exceed the declared burst under tight loops.

use std::sync::Arc;

use crate::algorithm::{validate_params, RateLimiter};
use crate::decision::DecisionRecord;
use crate::error::Result;
use crate::script::executor::AtomicExecutor;
use crate::script::{TOKEN_BUCKET_ATTEMPT, TOKEN_BUCKET_INSPECT};

/// Token bucket limiter. Cheap to clone: it holds only a shared executor
/// handle.
#[derive(Clone)]
pub struct TokenBucket {
    executor: Arc<AtomicExecutor>,
}

impl TokenBucket {
    pub(crate) fn new(executor: Arc<AtomicExecutor>) -> Self {
        Self { executor }
    }

    fn min_refill(rate: f64) -> f64 {
        (2.0 / rate).max(1.0)
    }

    fn full_key(&self, key: &str) -> String {
        self.executor.store().full_key("token", key)
    }

    fn ttl(burst: u64, rate: f64) -> u64 {
        ((burst as f64 / rate) * 2.0).ceil().max(1.0) as u64
    }
}

impl RateLimiter for TokenBucket {
    fn algorithm_name(&self) -> &'static str {
        "token"
    }

    async fn attempt(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<DecisionRecord> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let min_refill = Self::min_refill(rate);
        let ttl = Self::ttl(burst, rate);

        let (allowed, remaining, retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &TOKEN_BUCKET_ATTEMPT,
                &[&full_key],
                &[
                    burst.to_string(),
                    rate.to_string(),
                    min_refill.to_string(),
                    ttl.to_string(),
                ],
            )
            .await?;

        let retry_after = if allowed == 1 { 0 } else { retry_after };
        Ok(DecisionRecord::new(retry_after, remaining, burst))
    }

    async fn attempts(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let min_refill = Self::min_refill(rate);

        let (attempts, _remaining, _retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &TOKEN_BUCKET_INSPECT,
                &[&full_key],
                &[burst.to_string(), rate.to_string(), min_refill.to_string()],
            )
            .await?;

        Ok(attempts)
    }

    async fn remaining(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let min_refill = Self::min_refill(rate);

        let (_attempts, remaining, _retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &TOKEN_BUCKET_INSPECT,
                &[&full_key],
                &[burst.to_string(), rate.to_string(), min_refill.to_string()],
            )
            .await?;

        Ok(remaining)
    }

    async fn available_in(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let min_refill = Self::min_refill(rate);

        let (_attempts, _remaining, retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &TOKEN_BUCKET_INSPECT,
                &[&full_key],
                &[burst.to_string(), rate.to_string(), min_refill.to_string()],
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
    fn min_refill_floors_at_one_second() {
        assert_eq!(TokenBucket::min_refill(100.0), 1.0);
        assert_eq!(TokenBucket::min_refill(1.0), 2.0);
        assert_eq!(TokenBucket::min_refill(0.5), 4.0);
    }
}
