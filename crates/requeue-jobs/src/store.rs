//! Shared counter store abstraction.
//!
//! The retry middleware keeps one attempt counter per retry key in a store
//! shared by every worker. Implementations must make `create_if_absent` and
//! `increment` atomic so that two workers racing on the same key never observe
//! the same attempt number.

use crate::error::JobResult;
use async_trait::async_trait;

/// A connection checked out from a [`CounterStore`].
///
/// The connection is released when it is dropped.
#[async_trait]
pub trait CounterConnection: Send {
    /// Set `key` to `initial` unless it already exists. Returns true if the
    /// key was created.
    async fn create_if_absent(&mut self, key: &str, initial: i64) -> JobResult<bool>;

    /// Atomically increment `key` and return the new value.
    async fn increment(&mut self, key: &str) -> JobResult<i64>;

    /// Expire `key` after `seconds`.
    async fn set_expiry(&mut self, key: &str, seconds: u64) -> JobResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&mut self, key: &str) -> JobResult<()>;
}

/// Source of counter store connections.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Connection type handed out by this store.
    type Connection: CounterConnection;

    /// Check out a connection.
    async fn acquire(&self) -> JobResult<Self::Connection>;
}
