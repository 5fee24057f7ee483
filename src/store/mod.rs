//! Store configuration and connection handle.
//!
//! The engine talks to exactly one kind of collaborator: a Redis-protocol
//! store reachable through a pooled connection. `StoreHandle` is the only
//! thing a `Limiter` holds besides its own arguments.

use std::time::Duration;

use deadpool_redis::redis::{cmd, AsyncCommands};
use deadpool_redis::{Config, Connection, Pool, Runtime};

use crate::error::{ConnectionError, Result};

/// Store connection configuration.
///
/// Holds everything needed to establish and address a pooled connection:
/// the connection URL, pool size, a key prefix applied ahead of every
/// algorithm tag, and a timeout for establishing the initial connection.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Redis connection URL (e.g. "redis://localhost:6379").
    pub url: String,
    /// Connection pool size.
    pub pool_size: usize,
    /// Prefix applied ahead of every algorithm tag (`sliding:`, `gate:`, ...).
    pub key_prefix: String,
    /// Timeout used when establishing the initial pool connection.
    pub connection_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            pool_size: 16,
            key_prefix: String::new(),
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    /// Create a configuration pointed at the given URL, otherwise default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the prefix applied ahead of every algorithm tag.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the connection pool size.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Set the connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// A pooled connection to the store, plus the prefix every key is built
/// under.
///
/// This is the sole piece of state a `Limiter` carries. It has no
/// per-caller state: two limiters built from the same handle never observe
/// each other except through the store itself.
#[derive(Clone)]
pub struct StoreHandle {
    pool: Pool,
    key_prefix: String,
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl StoreHandle {
    /// Build a handle from configuration, verifying connectivity with a PING.
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ConnectionError::PoolExhausted(e.to_string()))?;

        let mut conn = tokio::time::timeout(config.connection_timeout, pool.get())
            .await
            .map_err(|_| ConnectionError::PoolExhausted("connection timed out".into()))?
            .map_err(|e| ConnectionError::PoolExhausted(e.to_string()))?;
        let _: () = cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| ConnectionError::CommandFailed(e.to_string()))?;

        Ok(Self {
            pool,
            key_prefix: config.key_prefix,
        })
    }

    /// Build a handle directly from a URL, using the rest of the defaults.
    pub async fn from_url(url: impl Into<String>) -> Result<Self> {
        Self::connect(StoreConfig::new(url)).await
    }

    /// Prefix a caller key with the configured store prefix and an
    /// algorithm tag, e.g. `sliding:user:42`.
    pub fn full_key(&self, tag: &str, key: &str) -> String {
        format!("{}{}:{}", self.key_prefix, tag, key)
    }

    /// Obtain a pooled connection.
    pub(crate) async fn conn(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| ConnectionError::PoolExhausted(e.to_string()).into())
    }

    /// Delete a key outright. Used by `reset` on single-key algorithms.
    /// Returns the number of keys actually removed (0 or 1).
    pub(crate) async fn delete(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed)
    }

    /// Remove a single member from an ordered set. Idempotent: removing an
    /// absent member is not an error, so a gate release of an unknown id
    /// silently succeeds.
    pub(crate) async fn zrem(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: u64 = conn.zrem(key, member).await?;
        Ok(())
    }

    /// Best-effort sweep over `prefix*` using a non-atomic SCAN cursor loop,
    /// deleting every matching key. Returns the number removed.
    ///
    /// Grounded on `QCK-SH-qck-backend-core`'s `get_statistics`/
    /// `clear_rate_limit` SCAN pattern. This is the only non-atomic
    /// operation in the engine: a sharded store may see keys come and go
    /// between SCAN calls, so the count is advisory, not a transactional
    /// guarantee.
    pub(crate) async fn scan_delete(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.conn().await?;
        let mut cursor: u64 = 0;
        let mut removed = 0u64;
        loop {
            let (next_cursor, keys): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut *conn)
                .await?;

            if !keys.is_empty() {
                let n: u64 = conn.del(&keys).await?;
                removed += n;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        Ok(removed)
    }
}
