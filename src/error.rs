//! Error types for the rate limiting engine.
//!
//! The hierarchy mirrors the taxonomy in the engine's error handling design:
//! transport failures propagate, script-source drift is fatal, argument-domain
//! errors are surfaced synchronously with no state touched, and a denied
//! admission is never an error.

use thiserror::Error;

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Top-level error type for rate limiting operations.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Argument-domain error (e.g. `rate <= 0.0`). No state was touched.
    #[error("invalid argument: {0}")]
    Config(#[from] ConfigError),

    /// Failed to obtain or use a connection to the store.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Script execution failed in a way that isn't a plain transport error.
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
}

/// Argument-domain errors. Surfaced synchronously as an invalid-argument
/// failure before any state is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `burst` must be greater than zero.
    #[error("burst must be > 0, got {0}")]
    InvalidBurst(u64),

    /// `rate` must be a positive, finite number.
    #[error("rate must be > 0, got {0}")]
    InvalidRate(f64),

    /// `window` must be greater than zero seconds.
    #[error("window must be > 0, got {0}")]
    InvalidWindow(u64),

    /// `max_in_flight` must be greater than zero.
    #[error("max_in_flight must be > 0, got {0}")]
    InvalidMaxInFlight(u64),

    /// `timeout` must be greater than zero seconds.
    #[error("timeout must be > 0, got {0}")]
    InvalidTimeout(u64),
}

/// Connection-related errors (pool exhaustion, transport failures).
///
/// These are safe to retry: every admission script is atomic, so a transport
/// failure never leaves ambiguous state — either the script ran, or it didn't.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Could not obtain a connection from the pool.
    #[error("failed to obtain a store connection: {0}")]
    PoolExhausted(String),

    /// The underlying store command failed.
    #[error("store command failed: {0}")]
    CommandFailed(String),
}

/// Errors specific to the atomic script-execution protocol.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The store reported a hash for a freshly loaded script that does not
    /// match the hash this process computed from the same source. This
    /// indicates source drift between processes and is always fatal — it
    /// means two builds disagree about what the script says.
    #[error(
        "script hash mismatch for {algorithm}/{operation}: expected {expected}, store returned {actual}"
    )]
    HashMismatch {
        /// Algorithm the script belongs to (e.g. "gcra").
        algorithm: &'static str,
        /// Operation the script implements (e.g. "attempt").
        operation: &'static str,
        /// Hash computed locally from the script source.
        expected: String,
        /// Hash the store returned after loading that same source.
        actual: String,
    },

    /// A transport-level error while loading or evaluating a script. A
    /// malformed result shape surfaces here too: `FromRedisValue`
    /// conversion failures come back from `redis` as a `RedisError`,
    /// which converts into this variant the same way a network failure
    /// would.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<deadpool_redis::redis::RedisError> for RateLimitError {
    fn from(err: deadpool_redis::redis::RedisError) -> Self {
        RateLimitError::Script(ScriptError::Transport(err.to_string()))
    }
}

impl From<deadpool_redis::PoolError> for RateLimitError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        RateLimitError::Connection(ConnectionError::PoolExhausted(err.to_string()))
    }
}
