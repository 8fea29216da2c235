//! Redis-backed counter store and queue transport.

mod store;
mod transport;

pub use store::{RedisCounterConnection, RedisCounterStore};
pub use transport::RedisQueueTransport;

use crate::config::RedisConfig;
use crate::error::{JobError, JobResult};
use deadpool_redis::{Config, Pool, Runtime};
use tracing::info;

/// Create a Redis connection pool.
pub async fn create_pool(config: &RedisConfig) -> JobResult<Pool> {
    info!("Creating Redis connection pool for job client...");

    let cfg = Config::from_url(&config.url);

    let pool = cfg
        .builder()
        .map_err(|e| JobError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .wait_timeout(Some(config.connect_timeout()))
        .create_timeout(Some(config.connect_timeout()))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| JobError::Configuration(format!("Failed to create pool: {}", e)))?;

    // Test connection
    let mut conn = pool.get().await?;
    redis::cmd("PING")
        .query_async::<String>(&mut *conn)
        .await?;

    info!("Redis connection pool created successfully");

    Ok(pool)
}

/// Resque-compatible key layout.
#[derive(Debug, Clone)]
pub struct RedisKeys {
    namespace: String,
}

impl RedisKeys {
    /// Create a key builder. `namespace` includes its trailing separator,
    /// e.g. `resque:`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// List of pending payloads for a queue.
    pub fn queue(&self, queue_name: &str) -> String {
        format!("{}queue:{}", self.namespace, queue_name)
    }

    /// Set of known queue names.
    pub fn queues(&self) -> String {
        format!("{}queues", self.namespace)
    }

    /// List of payloads due at `timestamp` (unix seconds).
    pub fn delayed(&self, timestamp: i64) -> String {
        format!("{}delayed:{}", self.namespace, timestamp)
    }

    /// Sorted set of timestamps that have delayed payloads.
    pub fn delayed_schedule(&self) -> String {
        format!("{}delayed_queue_schedule", self.namespace)
    }
}

impl Default for RedisKeys {
    fn default() -> Self {
        Self::new("resque:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_keys() {
        let keys = RedisKeys::new("test:");

        assert_eq!(keys.queue("default"), "test:queue:default");
        assert_eq!(keys.queues(), "test:queues");
        assert_eq!(keys.delayed(1700000000), "test:delayed:1700000000");
        assert_eq!(keys.delayed_schedule(), "test:delayed_queue_schedule");
    }

    #[test]
    fn test_default_namespace() {
        assert_eq!(RedisKeys::default().queue("mailers"), "resque:queue:mailers");
    }
}
