//! Redis-backed [`RateLimitStorage`].

use crate::{RateLimitStorage, StorageStatus};
use amazon_error::{AmazonError, AmazonResult, ConnectionFailure};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fixed-window admission: increments the key and starts its window on the
/// first hit, refusing once the count reaches the limit.
const ADMIT_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= tonumber(ARGV[1]) then
    return 0
end
current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[2])
end
return 1
"#;

/// Fixed-window counter in Redis, shared by every instance using the same prefix.
pub struct RedisRateLimitStorage {
    connection: ConnectionManager,
    script: redis::Script,
    url: String,
    prefix: String,
    limit: u64,
    window: Duration,
}

impl std::fmt::Debug for RedisRateLimitStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimitStorage")
            .field("url", &self.url)
            .field("prefix", &self.prefix)
            .field("limit", &self.limit)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

fn storage_error(url: &str, command: &str, error: redis::RedisError) -> AmazonError {
    let failure = if error.is_timeout() {
        ConnectionFailure::Timeout
    } else {
        ConnectionFailure::Refused
    };
    AmazonError::connection(failure, url, command).with_cause(error)
}

impl RedisRateLimitStorage {
    /// Connect to `url`, allowing `limit` admissions per `window` for each key.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the client cannot be created or the
    /// server is unreachable.
    #[instrument(skip(url), fields(limit, window_ms = window.as_millis() as u64))]
    pub async fn connect(url: &str, limit: u64, window: Duration) -> AmazonResult<Self> {
        let client = redis::Client::open(url).map_err(|e| storage_error(url, "OPEN", e))?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(|e| storage_error(url, "CONNECT", e))?;
        debug!("Connected rate limit storage to Redis");
        Ok(Self {
            connection,
            script: redis::Script::new(ADMIT_SCRIPT),
            url: url.to_string(),
            prefix: "amazon-core:ratelimit".to_string(),
            limit,
            window,
        })
    }

    /// Namespace prepended to every key.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait]
impl RateLimitStorage for RedisRateLimitStorage {
    async fn consume(&self, key: &str) -> AmazonResult<bool> {
        let mut connection = self.connection.clone();
        let window_ms = (self.window.as_millis() as u64).max(1);
        let admitted: i64 = self
            .script
            .key(self.redis_key(key))
            .arg(self.limit)
            .arg(window_ms)
            .invoke_async(&mut connection)
            .await
            .map_err(|e| storage_error(&self.url, "EVALSHA", e))?;
        Ok(admitted == 1)
    }

    async fn status(&self, key: &str) -> AmazonResult<StorageStatus> {
        let mut connection = self.connection.clone();
        let redis_key = self.redis_key(key);
        let (count, ttl_ms): (Option<u64>, i64) = redis::pipe()
            .get(&redis_key)
            .pttl(&redis_key)
            .query_async(&mut connection)
            .await
            .map_err(|e| storage_error(&self.url, "GET", e))?;
        Ok(StorageStatus {
            remaining: self.limit.saturating_sub(count.unwrap_or(0)),
            limit: self.limit,
            reset_in: Duration::from_millis(u64::try_from(ttl_ms).unwrap_or(0)),
        })
    }

    async fn reset(&self, key: &str) -> AmazonResult<()> {
        let mut connection = self.connection.clone();
        connection
            .del::<_, ()>(self.redis_key(key))
            .await
            .map_err(|e| storage_error(&self.url, "DEL", e))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
