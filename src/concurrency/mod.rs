//! Concurrency gate and the composer that layers it over a rate-limit
//! algorithm.

use std::sync::Arc;

use crate::algorithm::{validate_params, RateLimiter};
use crate::decision::{ConcurrencyDecision, DecisionRecord};
use crate::error::{ConfigError, Result};
use crate::script::executor::AtomicExecutor;
use crate::script::{GATE_CLEANUP, GATE_CURRENT, GATE_TRY_ACQUIRE};

/// Leased-slot semaphore over a time-scored ordered set. A lease is held
/// until explicit `release` or until `timeout` elapses, at which point
/// any subsequent gate access evicts it.
#[derive(Clone)]
pub struct ConcurrencyGate {
    executor: Arc<AtomicExecutor>,
}

impl ConcurrencyGate {
    pub(crate) fn new(executor: Arc<AtomicExecutor>) -> Self {
        Self { executor }
    }

    fn full_key(&self, key: &str) -> String {
        self.executor.store().full_key("gate", key)
    }

    /// Attempt to acquire a slot. Returns `(acquired, current_in_flight)`.
    ///
    /// Re-acquiring with a `request_id` that already holds a live lease
    /// is a no-op that returns `(false, current)` — the gate does not
    /// refcount.
    pub async fn try_acquire(
        &self,
        key: &str,
        request_id: &str,
        max_in_flight: u64,
        timeout: u64,
    ) -> Result<(bool, u64)> {
        if max_in_flight == 0 {
            return Err(ConfigError::InvalidMaxInFlight(max_in_flight).into());
        }
        if timeout == 0 {
            return Err(ConfigError::InvalidTimeout(timeout).into());
        }

        let full_key = self.full_key(key);
        let (acquired, current): (u64, u64) = self
            .executor
            .execute(
                &GATE_TRY_ACQUIRE,
                &[&full_key],
                &[request_id.to_string(), max_in_flight.to_string(), timeout.to_string()],
            )
            .await?;

        Ok((acquired == 1, current))
    }

    /// Release a lease. Releasing an id that holds no lease silently
    /// succeeds.
    pub async fn release(&self, key: &str, request_id: &str) -> Result<()> {
        self.executor.store().zrem(&self.full_key(key), request_id).await
    }

    /// Current occupancy after evicting expired leases.
    pub async fn current(&self, key: &str, timeout: u64) -> Result<u64> {
        if timeout == 0 {
            return Err(ConfigError::InvalidTimeout(timeout).into());
        }
        let full_key = self.full_key(key);
        self.executor
            .execute(&GATE_CURRENT, &[&full_key], &[timeout.to_string()])
            .await
    }

    /// Evict expired leases and return how many were removed.
    pub async fn cleanup(&self, key: &str, timeout: u64) -> Result<u64> {
        if timeout == 0 {
            return Err(ConfigError::InvalidTimeout(timeout).into());
        }
        let full_key = self.full_key(key);
        self.executor
            .execute(&GATE_CLEANUP, &[&full_key], &[timeout.to_string()])
            .await
    }
}

/// Sequences a gate acquire, a base-limiter admission, and a
/// release-on-rate-deny into a single decision that distinguishes *why*
/// a call was denied.
///
/// When `base` is absent this runs in pure-gate mode: the gate is the
/// only admission criterion, and an allowed decision carries an
/// uncapped base record (`limit = u64::MAX`).
pub struct ConcurrencyAwareLimiter<L: RateLimiter> {
    gate: ConcurrencyGate,
    base: Option<L>,
}

impl<L: RateLimiter> ConcurrencyAwareLimiter<L> {
    pub(crate) fn new(gate: ConcurrencyGate, base: Option<L>) -> Self {
        Self { gate, base }
    }

    /// Run the composed admission protocol.
    #[allow(clippy::too_many_arguments)]
    pub async fn attempt_with_concurrency(
        &self,
        key: &str,
        request_id: &str,
        max_in_flight: u64,
        burst: u64,
        rate: f64,
        window: u64,
        timeout: u64,
    ) -> Result<ConcurrencyDecision> {
        if let Some(base) = &self.base {
            validate_params(burst, rate, window)?;
            let _ = base; // validate before the gate is touched so a bad argument never takes a lease
        }

        let (acquired, current_after_acquire) =
            self.gate.try_acquire(key, request_id, max_in_flight, timeout).await?;

        if !acquired {
            return Ok(ConcurrencyDecision::DeniedByGate {
                current_in_flight: current_after_acquire,
                max_in_flight,
            });
        }

        let Some(base) = &self.base else {
            return Ok(ConcurrencyDecision::Allowed {
                base: DecisionRecord::new(0, u64::MAX, u64::MAX),
                current_in_flight: current_after_acquire,
                max_in_flight,
            });
        };

        let record = base.attempt(key, burst, rate, window).await?;

        if record.allowed() {
            return Ok(ConcurrencyDecision::Allowed {
                base: record,
                current_in_flight: current_after_acquire,
                max_in_flight,
            });
        }

        self.gate.release(key, request_id).await?;

        Ok(ConcurrencyDecision::DeniedByRate {
            base: record,
            current_in_flight: current_after_acquire.saturating_sub(1),
            max_in_flight,
        })
    }

    /// Release a slot held by a prior successful `attempt_with_concurrency`.
    pub async fn release_concurrency(&self, key: &str, request_id: &str) -> Result<()> {
        self.gate.release(key, request_id).await
    }

    /// Current gate occupancy for `key`.
    pub async fn current_in_flight(&self, key: &str, timeout: u64) -> Result<u64> {
        self.gate.current(key, timeout).await
    }
}
