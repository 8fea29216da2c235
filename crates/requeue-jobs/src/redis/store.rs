//! Redis attempt counter store.

use crate::error::JobResult;
use crate::store::{CounterConnection, CounterStore};
use async_trait::async_trait;
use deadpool_redis::{Connection, Pool};
use redis::AsyncCommands;

/// Counter store on a Redis pool.
///
/// `SETNX` and `INCR` are atomic on the server, so concurrent workers
/// always read distinct attempt numbers.
#[derive(Clone)]
pub struct RedisCounterStore {
    pool: Pool,
}

impl RedisCounterStore {
    /// Create a store on `pool`.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    type Connection = RedisCounterConnection;

    async fn acquire(&self) -> JobResult<RedisCounterConnection> {
        Ok(RedisCounterConnection {
            conn: self.pool.get().await?,
        })
    }
}

/// Pooled connection; returned to the pool on drop.
pub struct RedisCounterConnection {
    conn: Connection,
}

#[async_trait]
impl CounterConnection for RedisCounterConnection {
    async fn create_if_absent(&mut self, key: &str, initial: i64) -> JobResult<bool> {
        Ok(self.conn.set_nx(key, initial).await?)
    }

    async fn increment(&mut self, key: &str) -> JobResult<i64> {
        Ok(self.conn.incr(key, 1i64).await?)
    }

    async fn set_expiry(&mut self, key: &str, seconds: u64) -> JobResult<()> {
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        let _: () = self.conn.expire(key, seconds).await?;
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> JobResult<()> {
        let _: () = self.conn.del(key).await?;
        Ok(())
    }
}
