//! In-process counter store and queue transport.
//!
//! Useful for local development and for exercising middleware without a
//! Redis server. State lives behind `parking_lot` locks and is never held
//! across an await point.

use crate::error::{JobError, JobResult};
use crate::queue::QueueTransport;
use crate::store::{CounterConnection, CounterStore};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Counter {
    value: i64,
    expires_at: Option<Instant>,
}

impl Counter {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    counters: Mutex<HashMap<String, Counter>>,
    open_connections: AtomicUsize,
    unavailable: AtomicBool,
}

impl StoreState {
    fn with_live<R>(&self, f: impl FnOnce(&mut HashMap<String, Counter>) -> R) -> R {
        let mut counters = self.counters.lock();
        let now = Instant::now();
        counters.retain(|_, counter| !counter.is_expired(now));
        f(&mut counters)
    }
}

/// Counter store backed by a process-local map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    state: Arc<StoreState>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`, if present and not expired.
    pub fn get(&self, key: &str) -> Option<i64> {
        self.state
            .with_live(|counters| counters.get(key).map(|counter| counter.value))
    }

    /// Remaining time to live of `key`, if it has one.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.state.with_live(|counters| {
            counters
                .get(key)
                .and_then(|counter| counter.expires_at)
                .map(|at| at.saturating_duration_since(now))
        })
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.state.with_live(|counters| counters.len())
    }

    /// Returns true if the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Connections currently checked out.
    pub fn open_connections(&self) -> usize {
        self.state.open_connections.load(Ordering::SeqCst)
    }

    /// Make subsequent `acquire` calls fail, simulating a lost store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    type Connection = MemoryConnection;

    async fn acquire(&self) -> JobResult<MemoryConnection> {
        if self.state.unavailable.load(Ordering::SeqCst) {
            return Err(JobError::Store("Counter store unavailable".to_string()));
        }

        self.state.open_connections.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConnection {
            state: self.state.clone(),
        })
    }
}

/// Connection handed out by [`MemoryCounterStore`].
#[derive(Debug)]
pub struct MemoryConnection {
    state: Arc<StoreState>,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.state.open_connections.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CounterConnection for MemoryConnection {
    async fn create_if_absent(&mut self, key: &str, initial: i64) -> JobResult<bool> {
        Ok(self.state.with_live(|counters| {
            if counters.contains_key(key) {
                false
            } else {
                counters.insert(
                    key.to_string(),
                    Counter {
                        value: initial,
                        expires_at: None,
                    },
                );
                true
            }
        }))
    }

    async fn increment(&mut self, key: &str) -> JobResult<i64> {
        Ok(self.state.with_live(|counters| {
            let counter = counters.entry(key.to_string()).or_insert(Counter {
                value: 0,
                expires_at: None,
            });
            counter.value += 1;
            counter.value
        }))
    }

    async fn set_expiry(&mut self, key: &str, seconds: u64) -> JobResult<()> {
        // Past the clock's range the key simply never expires.
        let expires_at = Instant::now().checked_add(Duration::from_secs(seconds));
        self.state.with_live(|counters| {
            if let Some(counter) = counters.get_mut(key) {
                counter.expires_at = expires_at;
            }
        });
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> JobResult<()> {
        self.state.with_live(|counters| {
            counters.remove(key);
        });
        Ok(())
    }
}

/// A job handed to [`MemoryQueueTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueuedJob {
    /// Target queue.
    pub queue: String,
    /// Job class.
    pub class: String,
    /// Arguments.
    pub args: Vec<Value>,
    /// Delay requested, `None` for immediate enqueues.
    pub delay: Option<Duration>,
}

/// Queue transport that records every enqueue.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueueTransport {
    jobs: Arc<RwLock<Vec<EnqueuedJob>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryQueueTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every job enqueued so far.
    pub fn enqueued(&self) -> Vec<EnqueuedJob> {
        self.jobs.read().clone()
    }

    /// Drain and return the jobs enqueued so far.
    pub fn take(&self) -> Vec<EnqueuedJob> {
        std::mem::take(&mut *self.jobs.write())
    }

    /// Make subsequent enqueues fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn push(&self, job: EnqueuedJob) -> JobResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(JobError::Transport(format!(
                "Queue transport rejected job {} for queue {}",
                job.class, job.queue
            )));
        }

        self.jobs.write().push(job);
        Ok(())
    }
}

#[async_trait]
impl QueueTransport for MemoryQueueTransport {
    async fn enqueue_now(&self, queue: &str, class: &str, args: &[Value]) -> JobResult<()> {
        self.push(EnqueuedJob {
            queue: queue.to_string(),
            class: class.to_string(),
            args: args.to_vec(),
            delay: None,
        })
    }

    async fn enqueue_after(
        &self,
        delay: Duration,
        queue: &str,
        class: &str,
        args: &[Value],
    ) -> JobResult<()> {
        self.push(EnqueuedJob {
            queue: queue.to_string(),
            class: class.to_string(),
            args: args.to_vec(),
            delay: Some(delay),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_if_absent_then_increment() {
        let store = MemoryCounterStore::new();
        let mut conn = store.acquire().await.unwrap();

        assert!(conn.create_if_absent("k", 0).await.unwrap());
        assert!(!conn.create_if_absent("k", 0).await.unwrap());
        assert_eq!(conn.increment("k").await.unwrap(), 1);
        assert_eq!(conn.increment("k").await.unwrap(), 2);
        assert_eq!(store.get("k"), Some(2));
    }

    #[tokio::test]
    async fn test_delete_and_missing_delete() {
        let store = MemoryCounterStore::new();
        let mut conn = store.acquire().await.unwrap();
        conn.create_if_absent("k", 5).await.unwrap();

        conn.delete("k").await.unwrap();
        conn.delete("k").await.unwrap();
        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_expiry_is_tracked_and_enforced() {
        let store = MemoryCounterStore::new();
        let mut conn = store.acquire().await.unwrap();
        conn.create_if_absent("long", 0).await.unwrap();
        conn.set_expiry("long", 3600).await.unwrap();
        conn.create_if_absent("short", 0).await.unwrap();
        conn.set_expiry("short", 0).await.unwrap();

        let ttl = store.ttl("long").unwrap();
        assert!(ttl > Duration::from_secs(3590) && ttl <= Duration::from_secs(3600));
        assert_eq!(store.get("short"), None);
    }

    #[tokio::test]
    async fn test_unrepresentable_expiry_never_expires() {
        let store = MemoryCounterStore::new();
        let mut conn = store.acquire().await.unwrap();
        conn.create_if_absent("k", 0).await.unwrap();

        conn.set_expiry("k", u64::MAX).await.unwrap();

        assert_eq!(store.get("k"), Some(0));
        assert_eq!(store.ttl("k"), None);
    }

    #[tokio::test]
    async fn test_connections_released_on_drop() {
        let store = MemoryCounterStore::new();
        {
            let _a = store.acquire().await.unwrap();
            let _b = store.acquire().await.unwrap();
            assert_eq!(store.open_connections(), 2);
        }
        assert_eq!(store.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = MemoryCounterStore::new();
        store.set_unavailable(true);
        let err = store.acquire().await.unwrap_err();
        assert!(err.is_store());
        assert_eq!(store.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_transport_records_and_fails() {
        let transport = MemoryQueueTransport::new();
        transport.enqueue_now("q", "Job", &[json!(1)]).await.unwrap();
        transport
            .enqueue_after(Duration::from_secs(5), "q", "Job", &[json!(1)])
            .await
            .unwrap();
        assert_eq!(transport.take().len(), 2);
        assert!(transport.enqueued().is_empty());

        transport.set_failing(true);
        let err = transport.enqueue_now("q", "Job", &[]).await.unwrap_err();
        assert!(matches!(err, JobError::Transport(_)));
        assert!(transport.enqueued().is_empty());
    }
}
