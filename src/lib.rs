//! Distributed rate limiting over Redis.
//!
//! Every admission decision is made by a single Lua script evaluated
//! atomically on the store: five algorithms (sliding window, fixed window,
//! leaky bucket, token bucket, GCRA), a concurrency gate for bounding
//! in-flight requests, and a composer that layers the gate over any one
//! of the five algorithms and reports *why* a denied call was denied.
//!
//! # Quick start
//!
//! ```ignore
//! use ratelimit_redis::{Factory, StoreConfig, RateLimiter};
//!
//! #[tokio::main]
//! async fn main() -> ratelimit_redis::error::Result<()> {
//!     let factory = Factory::connect(StoreConfig::new("redis://127.0.0.1:6379")).await?;
//!     let limiter = factory.gcra();
//!
//!     let decision = limiter.attempt("user:42", 10, 5.0, 1).await?;
//!     if decision.allowed() {
//!         println!("admitted, {} left", decision.retries_left);
//!     } else {
//!         println!("denied, retry in {}s", decision.retry_after_seconds);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Algorithm | Best for |
//! |--------|-----------|----------|
//! | [`algorithm::SlidingWindow`] | sliding window counter | smooth enforcement, no burst edge |
//! | [`algorithm::FixedWindow`] | fixed window counter | cheapest, tolerates boundary bursts |
//! | [`algorithm::LeakyBucket`] | leaky bucket | smooth output rate |
//! | [`algorithm::TokenBucket`] | token bucket | bursty traffic with a refill floor |
//! | [`algorithm::GCRA`] | generic cell rate algorithm | precise smooth rate, single value of state |
//!
//! [`concurrency::ConcurrencyGate`] bounds in-flight requests independent
//! of call rate; [`concurrency::ConcurrencyAwareLimiter`] composes it with
//! any [`algorithm::RateLimiter`].

pub mod algorithm;
pub mod concurrency;
pub mod decision;
pub mod error;
pub mod factory;
pub mod script;
pub mod store;

pub use algorithm::{FixedWindow, GCRA, LeakyBucket, RateLimiter, SlidingWindow, TokenBucket};
pub use concurrency::{ConcurrencyAwareLimiter, ConcurrencyGate};
pub use decision::{ConcurrencyDecision, DecisionRecord, ExtendedDecisionRecord, RejectionCause};
pub use error::{ConfigError, ConnectionError, RateLimitError, Result, ScriptError};
pub use factory::Factory;
pub use store::{StoreConfig, StoreHandle};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::algorithm::RateLimiter;
    pub use crate::algorithm::{FixedWindow, GCRA, LeakyBucket, SlidingWindow, TokenBucket};
    pub use crate::concurrency::{ConcurrencyAwareLimiter, ConcurrencyGate};
    pub use crate::decision::{ConcurrencyDecision, DecisionRecord, ExtendedDecisionRecord, RejectionCause};
    pub use crate::error::{RateLimitError, Result};
    pub use crate::factory::Factory;
    pub use crate::store::{StoreConfig, StoreHandle};
}
