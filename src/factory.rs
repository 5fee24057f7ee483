//! Entry point for constructing limiters against a shared store.
//!
//! A `Factory` owns one `StoreHandle` and one `AtomicExecutor` built from
//! it; every limiter it hands out clones that same `Arc<AtomicExecutor>`,
//! so a process that builds five algorithms and a gate from one factory
//! still holds a single connection pool.

use std::sync::Arc;

use crate::algorithm::{FixedWindow, GCRA, LeakyBucket, SlidingWindow, TokenBucket};
use crate::algorithm::RateLimiter;
use crate::concurrency::{ConcurrencyAwareLimiter, ConcurrencyGate};
use crate::error::Result;
use crate::script::executor::AtomicExecutor;
use crate::store::{StoreConfig, StoreHandle};

/// Builds limiters and the concurrency gate against one shared store.
#[derive(Clone)]
pub struct Factory {
    executor: Arc<AtomicExecutor>,
}

impl Factory {
    /// Build a factory directly from a configuration, connecting to the
    /// store in the process.
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        let store = StoreHandle::connect(config).await?;
        Ok(Self::from_store(store))
    }

    /// Build a factory from an already-connected store handle.
    pub fn from_store(store: StoreHandle) -> Self {
        Self {
            executor: Arc::new(AtomicExecutor::new(store)),
        }
    }

    /// The underlying store handle, for callers that want to issue
    /// primitives this factory doesn't expose (e.g. diagnostics).
    pub fn store(&self) -> &StoreHandle {
        self.executor.store()
    }

    /// A sliding window limiter.
    pub fn sliding_window(&self) -> SlidingWindow {
        SlidingWindow::new(self.executor.clone())
    }

    /// A fixed window limiter.
    pub fn fixed_window(&self) -> FixedWindow {
        FixedWindow::new(self.executor.clone())
    }

    /// A leaky bucket limiter.
    pub fn leaky_bucket(&self) -> LeakyBucket {
        LeakyBucket::new(self.executor.clone())
    }

    /// A token bucket limiter.
    pub fn token_bucket(&self) -> TokenBucket {
        TokenBucket::new(self.executor.clone())
    }

    /// A GCRA limiter.
    pub fn gcra(&self) -> GCRA {
        GCRA::new(self.executor.clone())
    }

    /// The concurrency gate on its own, for pure-gate use without any
    /// rate-limit composition.
    pub fn concurrency_gate(&self) -> ConcurrencyGate {
        ConcurrencyGate::new(self.executor.clone())
    }

    /// A gate composed with a base rate limiter.
    pub fn with_concurrency<L: RateLimiter>(&self, base: L) -> ConcurrencyAwareLimiter<L> {
        ConcurrencyAwareLimiter::new(self.concurrency_gate(), Some(base))
    }

    /// A gate running alone, with no base rate limiter consulted (pure
    /// gate mode).
    pub fn gate_only<L: RateLimiter>(&self) -> ConcurrencyAwareLimiter<L> {
        ConcurrencyAwareLimiter::new(self.concurrency_gate(), None)
    }
}
