//! Leaky bucket rate limiting.
//!
//! State is `(level, last_leak)`; a drop is admitted iff the bucket has
//! room after leaking. `last_leak` only advances on admission — a denied
//! attempt leaks the bucket for the purpose of the decision but writes
//! nothing back, so `last_leak` stays monotonic per key without any
//! extra bookkeeping.

use std::sync::Arc;

use crate::algorithm::{validate_params, RateLimiter};
use crate::decision::DecisionRecord;
use crate::error::Result;
use crate::script::executor::AtomicExecutor;
use crate::script::{LEAKY_BUCKET_ATTEMPT, LEAKY_BUCKET_INSPECT};

/// Leaky bucket limiter. Cheap to clone: it holds only a shared executor
/// handle.
#[derive(Clone)]
pub struct LeakyBucket {
    executor: Arc<AtomicExecutor>,
}

impl LeakyBucket {
    pub(crate) fn new(executor: Arc<AtomicExecutor>) -> Self {
        Self { executor }
    }

    fn leak_interval(rate: f64) -> f64 {
        (1.0 / rate).ceil()
    }

    fn full_key(&self, key: &str) -> String {
        self.executor.store().full_key("leaky", key)
    }

    fn ttl(burst: u64, leak_interval: f64) -> u64 {
        ((burst as f64 + 1.0) * leak_interval * 2.0).ceil().max(1.0) as u64
    }
}

impl RateLimiter for LeakyBucket {
    fn algorithm_name(&self) -> &'static str {
        "leaky"
    }

    async fn attempt(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<DecisionRecord> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let leak_interval = Self::leak_interval(rate);
        let ttl = Self::ttl(burst, leak_interval);

        let (allowed, remaining, retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &LEAKY_BUCKET_ATTEMPT,
                &[&full_key],
                &[burst.to_string(), leak_interval.to_string(), ttl.to_string()],
            )
            .await?;

        let retry_after = if allowed == 1 { 0 } else { retry_after };
        Ok(DecisionRecord::new(retry_after, remaining, burst))
    }

    async fn attempts(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let leak_interval = Self::leak_interval(rate);

        let (level, _remaining, _retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &LEAKY_BUCKET_INSPECT,
                &[&full_key],
                &[burst.to_string(), leak_interval.to_string()],
            )
            .await?;

        Ok(level)
    }

    async fn remaining(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let leak_interval = Self::leak_interval(rate);

        let (_level, remaining, _retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &LEAKY_BUCKET_INSPECT,
                &[&full_key],
                &[burst.to_string(), leak_interval.to_string()],
            )
            .await?;

        Ok(remaining)
    }

    async fn available_in(&self, key: &str, burst: u64, rate: f64, window: u64) -> Result<u64> {
        validate_params(burst, rate, window)?;
        let full_key = self.full_key(key);
        let leak_interval = Self::leak_interval(rate);

        let (_level, _remaining, retry_after): (u64, u64, u64) = self
            .executor
            .execute(
                &LEAKY_BUCKET_INSPECT,
                &[&full_key],
                &[burst.to_string(), leak_interval.to_string()],
            )
            .await?;

        Ok(retry_after)
    }

    async fn reset(&self, key: &str) -> Result<u64> {
        self.executor.store().delete(&self.full_key(key)).await
    }
}
