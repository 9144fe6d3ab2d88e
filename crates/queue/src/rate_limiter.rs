use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::Script;
use tracing::debug;

use common::keys;

use crate::errors::QueueResult;

/// Token bucket shared across every worker process for one instance.
/// Refill and take happen inside a single Lua script so the
/// read-compute-write cycle is atomic under concurrent callers.
const TAKE_SCRIPT: &str = r#"
local bucket_key = KEYS[1]
local ts_key = KEYS[2]
local capacity = tonumber(ARGV[1])
local rate = tonumber(ARGV[2])
local now = tonumber(ARGV[3])

local tokens = tonumber(redis.call('GET', bucket_key))
local last_refill = tonumber(redis.call('GET', ts_key))

if tokens == nil then
  tokens = capacity
end
if last_refill == nil then
  last_refill = now
end

local elapsed = now - last_refill
if elapsed < 0 then
  elapsed = 0
end

tokens = math.min(capacity, tokens + math.floor(elapsed * rate))

local allowed = 0
if tokens >= 1 then
  tokens = tokens - 1
  allowed = 1
end

redis.call('SET', bucket_key, tokens)
redis.call('SET', ts_key, now)

return allowed
"#;

pub struct RateLimiter {
    conn: ConnectionManager,
    tokens_per_second: f64,
    capacity: f64,
    take_script: Script,
}

impl RateLimiter {
    pub fn new(conn: ConnectionManager, tokens_per_second: f64, capacity: f64) -> Self {
        Self {
            conn,
            tokens_per_second,
            capacity,
            take_script: Script::new(TAKE_SCRIPT),
        }
    }

    /// Attempts to take one token for `instance`. Never blocks.
    pub async fn try_take(&mut self, instance: &str) -> QueueResult<bool> {
        let now = chrono::Utc::now().timestamp() as f64;
        let allowed: i64 = self
            .take_script
            .key(keys::rate_bucket(instance))
            .key(keys::rate_bucket_timestamp(instance))
            .arg(self.capacity)
            .arg(self.tokens_per_second)
            .arg(now)
            .invoke_async(&mut self.conn)
            .await?;
        Ok(allowed == 1)
    }

    /// Blocks until a token is available. Sleeps grow exponentially from
    /// 100ms, doubling each failed attempt, capped at ~1s; after roughly
    /// ten failed attempts the sleep settles at the cap rather than
    /// continuing to grow, so a persistently-exhausted bucket doesn't
    /// stall a retrying worker for longer and longer.
    pub async fn wait_for_token(&mut self, instance: &str) {
        let mut delay = Duration::from_millis(100);
        let cap = Duration::from_millis(1000);
        let mut attempt: u32 = 0;

        loop {
            match self.try_take(instance).await {
                Ok(true) => return,
                Ok(false) => {}
                Err(err) => {
                    debug!(instance, error = %err, "rate limiter check failed, backing off");
                }
            }

            tokio::time::sleep(delay).await;
            attempt += 1;
            if attempt < 10 {
                delay = (delay * 2).min(cap);
            } else {
                delay = cap;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_text_is_nonempty() {
        assert!(!TAKE_SCRIPT.trim().is_empty());
    }
}
