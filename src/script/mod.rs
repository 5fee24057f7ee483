//! The script catalogue: every admission algorithm and the concurrency
//! gate, expressed as Redis Lua scripts plus a stable content hash.
//!
//! Each script reads the wall clock exclusively through Redis `TIME` so
//! every decision is ordered against the store's clock, never the
//! caller's — mixing in caller-local time would let clock skew between
//! callers produce non-monotonic state.

mod catalogue;
pub mod executor;

pub use catalogue::*;
pub use executor::AtomicExecutor;

use std::sync::OnceLock;

use deadpool_redis::redis::Script;

/// One entry of the script catalogue: an (algorithm, operation) pair and
/// its source. The hash is computed lazily from the source the first time
/// it's needed, never baked in as a literal constant — baking hashes at
/// build time is a performance optimization, not a correctness
/// requirement, and computing them from source is what keeps source and
/// hash from ever drifting apart.
pub struct ScriptDef {
    /// Algorithm this script belongs to (e.g. "gcra", "gate").
    pub algorithm: &'static str,
    /// Operation this script implements (e.g. "attempt", "inspect").
    pub operation: &'static str,
    /// Lua source.
    pub source: &'static str,
    hash: OnceLock<String>,
    script: OnceLock<Script>,
}

impl ScriptDef {
    const fn new(algorithm: &'static str, operation: &'static str, source: &'static str) -> Self {
        Self {
            algorithm,
            operation,
            source,
            hash: OnceLock::new(),
            script: OnceLock::new(),
        }
    }

    fn script(&self) -> &Script {
        self.script.get_or_init(|| Script::new(self.source))
    }

    /// Content hash, `SHA1(source)`, computed once and memoized.
    pub fn hash(&self) -> &str {
        self.hash
            .get_or_init(|| self.script().get_hash().to_string())
    }
}

impl std::fmt::Debug for ScriptDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptDef")
            .field("algorithm", &self.algorithm)
            .field("operation", &self.operation)
            .field("hash", &self.hash.get())
            .finish()
    }
}
