//! Lua sources for every (algorithm, operation) pair.
//!
//! Formulas follow the canonical per-algorithm semantics exactly: the
//! `floor`/`ceil` choices below are load-bearing, not stylistic — getting
//! one backwards produces an off-by-one admission count under the
//! testable properties this crate is built against.

use super::ScriptDef;

// ---------------------------------------------------------------------
// Sliding window
// ---------------------------------------------------------------------

pub static SLIDING_WINDOW_ATTEMPT: ScriptDef = ScriptDef::new(
    "sliding",
    "attempt",
    r#"
local key = KEYS[1]
local window = tonumber(ARGV[1])
local max_requests = tonumber(ARGV[2])

local time = redis.call('TIME')
local now = tonumber(time[1])
local now_us = tonumber(time[2])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)

if count >= max_requests then
  local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
  local retry_after = 1
  if oldest[2] then
    retry_after = math.max(1, math.ceil((tonumber(oldest[2]) + window) - now))
  end
  return {0, 0, retry_after}
end

local member = tostring(now) .. '.' .. tostring(now_us)
redis.call('ZADD', key, now, member)
redis.call('EXPIRE', key, window)

return {1, max_requests - count - 1, 0}
"#,
);

pub static SLIDING_WINDOW_INSPECT: ScriptDef = ScriptDef::new(
    "sliding",
    "inspect",
    r#"
local key = KEYS[1]
local window = tonumber(ARGV[1])
local max_requests = tonumber(ARGV[2])

local time = redis.call('TIME')
local now = tonumber(time[1])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)

local retry_after = 0
if count >= max_requests then
  local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
  retry_after = 1
  if oldest[2] then
    retry_after = math.max(1, math.ceil((tonumber(oldest[2]) + window) - now))
  end
end

return {count, math.max(0, max_requests - count), retry_after}
"#,
);

// ---------------------------------------------------------------------
// Fixed window
// ---------------------------------------------------------------------

pub static FIXED_WINDOW_ATTEMPT: ScriptDef = ScriptDef::new(
    "fixed",
    "attempt",
    r#"
local key_prefix = KEYS[1]
local window = tonumber(ARGV[1])
local cap = tonumber(ARGV[2])

local time = redis.call('TIME')
local now = tonumber(time[1])
local slot = math.floor(now / window)
local key = key_prefix .. ':' .. tostring(slot)

local count = redis.call('INCR', key)
if count == 1 then
  redis.call('EXPIRE', key, window)
end

local slot_end = (slot + 1) * window

if count > cap then
  return {0, 0, math.max(1, slot_end - now)}
end

return {1, cap - count, 0}
"#,
);

pub static FIXED_WINDOW_INSPECT: ScriptDef = ScriptDef::new(
    "fixed",
    "inspect",
    r#"
local key_prefix = KEYS[1]
local window = tonumber(ARGV[1])
local cap = tonumber(ARGV[2])

local time = redis.call('TIME')
local now = tonumber(time[1])
local slot = math.floor(now / window)
local key = key_prefix .. ':' .. tostring(slot)

local count = tonumber(redis.call('GET', key)) or 0
local slot_end = (slot + 1) * window

local retry_after = 0
if count >= cap then
  retry_after = math.max(1, slot_end - now)
end

return {count, math.max(0, cap - count), retry_after}
"#,
);

// ---------------------------------------------------------------------
// Leaky bucket
// ---------------------------------------------------------------------

pub static LEAKY_BUCKET_ATTEMPT: ScriptDef = ScriptDef::new(
    "leaky",
    "attempt",
    r#"
local key = KEYS[1]
local burst = tonumber(ARGV[1])
local leak_interval = tonumber(ARGV[2])
local ttl = tonumber(ARGV[3])

local time = redis.call('TIME')
local now = tonumber(time[1])

local data = redis.call('HMGET', key, 'level', 'last_leak')
local stored_level = tonumber(data[1]) or 0
local last_leak = tonumber(data[2]) or now

local leaked = math.floor((now - last_leak) / leak_interval)
local level = math.max(0, stored_level - leaked)

if level < burst then
  level = level + 1
  redis.call('HMSET', key, 'level', level, 'last_leak', now)
  redis.call('EXPIRE', key, ttl)
  return {1, math.max(0, burst - level), 0}
end

local retry_after = math.ceil((level - burst + 1) * leak_interval - (now - last_leak))
return {0, 0, math.max(1, retry_after)}
"#,
);

pub static LEAKY_BUCKET_INSPECT: ScriptDef = ScriptDef::new(
    "leaky",
    "inspect",
    r#"
local key = KEYS[1]
local burst = tonumber(ARGV[1])
local leak_interval = tonumber(ARGV[2])

local time = redis.call('TIME')
local now = tonumber(time[1])

local data = redis.call('HMGET', key, 'level', 'last_leak')
local stored_level = tonumber(data[1]) or 0
local last_leak = tonumber(data[2]) or now

local leaked = math.floor((now - last_leak) / leak_interval)
local level = math.max(0, stored_level - leaked)

local retry_after = 0
if level >= burst then
  retry_after = math.max(1, math.ceil((level - burst + 1) * leak_interval - (now - last_leak)))
end

return {level, math.max(0, burst - level), retry_after}
"#,
);

// ---------------------------------------------------------------------
// Token bucket
// ---------------------------------------------------------------------

pub static TOKEN_BUCKET_ATTEMPT: ScriptDef = ScriptDef::new(
    "token",
    "attempt",
    r#"
local key = KEYS[1]
local burst = tonumber(ARGV[1])
local rate = tonumber(ARGV[2])
local min_refill = tonumber(ARGV[3])
local ttl = tonumber(ARGV[4])

local time = redis.call('TIME')
local now = tonumber(time[1]) + (tonumber(time[2]) / 1000000.0)

local data = redis.call('HMGET', key, 'tokens', 'last_refill', 'attempts')
local tokens = tonumber(data[1])
local last_refill = tonumber(data[2])
local attempts = tonumber(data[3]) or 0

if tokens == nil then
  tokens = burst
  last_refill = now
end

local elapsed = now - last_refill
if elapsed >= min_refill then
  tokens = math.min(burst, tokens + math.floor(elapsed * rate))
  last_refill = now
end

attempts = attempts + 1

local allowed, retry_after
if tokens >= 1 then
  tokens = tokens - 1
  allowed = 1
  retry_after = 0
else
  allowed = 0
  retry_after = math.ceil(math.max(1 / rate, min_refill - elapsed))
end

redis.call('HMSET', key, 'tokens', tokens, 'last_refill', last_refill, 'attempts', attempts)
redis.call('EXPIRE', key, ttl)

return {allowed, math.floor(tokens), retry_after}
"#,
);

pub static TOKEN_BUCKET_INSPECT: ScriptDef = ScriptDef::new(
    "token",
    "inspect",
    r#"
local key = KEYS[1]
local burst = tonumber(ARGV[1])
local rate = tonumber(ARGV[2])
local min_refill = tonumber(ARGV[3])

local time = redis.call('TIME')
local now = tonumber(time[1]) + (tonumber(time[2]) / 1000000.0)

local data = redis.call('HMGET', key, 'tokens', 'last_refill', 'attempts')
local tokens = tonumber(data[1])
local last_refill = tonumber(data[2])
local attempts = tonumber(data[3]) or 0

if tokens == nil then
  tokens = burst
  last_refill = now
end

local elapsed = now - last_refill
if elapsed >= min_refill then
  tokens = math.min(burst, tokens + math.floor(elapsed * rate))
end

local retry_after = 0
if tokens < 1 then
  retry_after = math.ceil(math.max(1 / rate, min_refill - elapsed))
end

return {attempts, math.floor(tokens), retry_after}
"#,
);

// ---------------------------------------------------------------------
// GCRA
// ---------------------------------------------------------------------

pub static GCRA_ATTEMPT: ScriptDef = ScriptDef::new(
    "gcra",
    "attempt",
    r#"
local key = KEYS[1]
local period = tonumber(ARGV[1])
local limit = tonumber(ARGV[2])
local separation = tonumber(ARGV[3])
local ttl = tonumber(ARGV[4])

local time = redis.call('TIME')
local now = tonumber(time[1]) + (tonumber(time[2]) / 1000000.0)

local stored_tat = tonumber(redis.call('GET', key))
local tat = math.max(stored_tat or now, now)

if (tat - now) <= (period - separation) then
  local new_tat = tat + separation
  redis.call('SET', key, string.format('%.6f', new_tat), 'EX', ttl)
  local retries_left = math.max(0, limit - math.floor((new_tat - now) / separation) - 1)
  return {1, retries_left, 0}
end

local retry_after = math.ceil(tat - now - period + separation)
return {0, 0, math.max(1, retry_after)}
"#,
);

pub static GCRA_INSPECT: ScriptDef = ScriptDef::new(
    "gcra",
    "inspect",
    r#"
local key = KEYS[1]
local period = tonumber(ARGV[1])
local limit = tonumber(ARGV[2])
local separation = tonumber(ARGV[3])

local time = redis.call('TIME')
local now = tonumber(time[1]) + (tonumber(time[2]) / 1000000.0)

local stored_tat = tonumber(redis.call('GET', key))
local tat = math.max(stored_tat or now, now)

if (tat - now) <= (period - separation) then
  local retries_left = math.max(0, limit - math.floor((tat - now) / separation))
  return {limit - retries_left, retries_left, 0}
end

local retry_after = math.ceil(tat - now - period + separation)
return {limit, 0, math.max(1, retry_after)}
"#,
);

// ---------------------------------------------------------------------
// Concurrency gate
// ---------------------------------------------------------------------

pub static GATE_TRY_ACQUIRE: ScriptDef = ScriptDef::new(
    "gate",
    "try_acquire",
    r#"
local key = KEYS[1]
local request_id = ARGV[1]
local max = tonumber(ARGV[2])
local timeout = tonumber(ARGV[3])

local time = redis.call('TIME')
local now = tonumber(time[1])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - timeout)
local count = redis.call('ZCARD', key)

if redis.call('ZSCORE', key, request_id) then
  return {0, count}
end

if count >= max then
  return {0, count}
end

redis.call('ZADD', key, now, request_id)
redis.call('EXPIRE', key, timeout * 2)

return {1, count + 1}
"#,
);

pub static GATE_CURRENT: ScriptDef = ScriptDef::new(
    "gate",
    "current",
    r#"
local key = KEYS[1]
local timeout = tonumber(ARGV[1])

local time = redis.call('TIME')
local now = tonumber(time[1])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - timeout)
return redis.call('ZCARD', key)
"#,
);

pub static GATE_CLEANUP: ScriptDef = ScriptDef::new(
    "gate",
    "cleanup",
    r#"
local key = KEYS[1]
local timeout = tonumber(ARGV[1])

local time = redis.call('TIME')
local now = tonumber(time[1])

return redis.call('ZREMRANGEBYSCORE', key, '-inf', now - timeout)
"#,
);
