//! Redis queue transport in the resque / resque-scheduler layout.

use super::RedisKeys;
use crate::config::RedisConfig;
use crate::error::{JobError, JobResult};
use crate::queue::QueueTransport;
use async_trait::async_trait;
use chrono::Utc;
use deadpool_redis::Pool;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct WirePayload<'a> {
    class: &'a str,
    args: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    queue: Option<&'a str>,
}

/// Queue transport writing resque payloads to Redis.
#[derive(Clone)]
pub struct RedisQueueTransport {
    pool: Pool,
    keys: RedisKeys,
}

impl RedisQueueTransport {
    /// Create a transport on `pool` using the configured namespace.
    pub fn new(pool: Pool, config: &RedisConfig) -> Self {
        Self {
            pool,
            keys: RedisKeys::new(&config.namespace),
        }
    }

    /// Key layout used by this transport.
    pub fn keys(&self) -> &RedisKeys {
        &self.keys
    }

    async fn conn(&self) -> JobResult<deadpool_redis::Connection> {
        self.pool.get().await.map_err(transport_error)
    }
}

fn transport_error(err: impl std::fmt::Display) -> JobError {
    JobError::Transport(err.to_string())
}

fn encode(class: &str, args: &[Value], queue: Option<&str>) -> JobResult<String> {
    Ok(serde_json::to_string(&WirePayload { class, args, queue })?)
}

#[async_trait]
impl QueueTransport for RedisQueueTransport {
    async fn enqueue_now(&self, queue: &str, class: &str, args: &[Value]) -> JobResult<()> {
        let payload = encode(class, args, None)?;
        let mut conn = self.conn().await?;

        let _: () = redis::pipe()
            .atomic()
            .sadd(self.keys.queues(), queue)
            .ignore()
            .rpush(self.keys.queue(queue), &payload)
            .ignore()
            .query_async(&mut *conn)
            .await
            .map_err(transport_error)?;

        debug!(queue = %queue, class = %class, "Enqueued job");
        Ok(())
    }

    async fn enqueue_after(
        &self,
        delay: Duration,
        queue: &str,
        class: &str,
        args: &[Value],
    ) -> JobResult<()> {
        let payload = encode(class, args, Some(queue))?;
        let delay_secs = i64::try_from(delay.as_secs()).unwrap_or(i64::MAX);
        let run_at = Utc::now().timestamp().saturating_add(delay_secs);
        let mut conn = self.conn().await?;

        let _: () = redis::pipe()
            .atomic()
            .rpush(self.keys.delayed(run_at), &payload)
            .ignore()
            .zadd(self.keys.delayed_schedule(), run_at, run_at)
            .ignore()
            .query_async(&mut *conn)
            .await
            .map_err(transport_error)?;

        debug!(queue = %queue, class = %class, run_at, "Scheduled delayed job");
        Ok(())
    }
}
