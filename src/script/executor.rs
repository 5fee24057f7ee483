//! The atomic executor: run a catalogue script by hash, reloading on a
//! cache miss and verifying the reload before trusting it.

use dashmap::DashSet;
use deadpool_redis::redis::{cmd, ErrorKind, FromRedisValue, RedisError};
use tracing::{debug, trace};

use crate::error::{Result, ScriptError};
use crate::script::ScriptDef;
use crate::store::StoreHandle;

/// Runs catalogue scripts against a store, reloading on NOSCRIPT.
///
/// The in-process memo of "hashes confirmed loaded" is a pure
/// optimization, scoped to one store handle rather than promoted to a
/// process-wide singleton: correctness never depends on it, because
/// every call is prepared to reload on a miss regardless of what the
/// memo says.
pub struct AtomicExecutor {
    store: StoreHandle,
    loaded: DashSet<&'static str>,
}

impl AtomicExecutor {
    /// Build an executor over the given store handle.
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            loaded: DashSet::new(),
        }
    }

    /// Run `def` with the given keys and arguments, returning the script's
    /// raw result decoded as `T`.
    pub async fn execute<T>(&self, def: &'static ScriptDef, keys: &[&str], args: &[String]) -> Result<T>
    where
        T: FromRedisValue,
    {
        let hash = def.hash();
        let mut conn = self.store.conn().await?;

        if self.loaded.contains(hash) {
            trace!(algorithm = def.algorithm, operation = def.operation, "evalsha (memoized)");
        }

        let mut evalsha = cmd("EVALSHA");
        evalsha.arg(hash).arg(keys.len());
        for key in keys {
            evalsha.arg(*key);
        }
        for arg in args {
            evalsha.arg(arg);
        }

        match evalsha.query_async::<T>(&mut *conn).await {
            Ok(value) => {
                self.loaded.insert(hash);
                Ok(value)
            }
            Err(err) if is_noscript(&err) => {
                debug!(algorithm = def.algorithm, operation = def.operation, "script cache miss, reloading");

                let loaded_hash: String = cmd("SCRIPT")
                    .arg("LOAD")
                    .arg(def.source)
                    .query_async(&mut *conn)
                    .await?;

                if loaded_hash != hash {
                    return Err(ScriptError::HashMismatch {
                        algorithm: def.algorithm,
                        operation: def.operation,
                        expected: hash.to_string(),
                        actual: loaded_hash,
                    }
                    .into());
                }

                self.loaded.insert(hash);

                let mut retry = cmd("EVALSHA");
                retry.arg(hash).arg(keys.len());
                for key in keys {
                    retry.arg(*key);
                }
                for arg in args {
                    retry.arg(arg);
                }
                let value = retry.query_async(&mut *conn).await?;
                Ok(value)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The store handle this executor runs against.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }
}

fn is_noscript(err: &RedisError) -> bool {
    err.kind() == ErrorKind::NoScriptError
}
