//! Requeue Jobs - middleware and retries for background jobs
//!
//! Wraps job handlers in a composable middleware chain. The main middleware
//! re-enqueues failed jobs with backoff:
//! - Middleware chain with registration-ordered nesting
//! - Attempt counting in a shared store, keyed by queue and argument content
//! - Per-attempt backoff schedule with a bounded retry count
//! - Resque-compatible Redis store and transport
//! - Explicit handler registry for dispatch by job class
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    MiddlewareChain                       │
//! │  ┌────────────┐   ┌─────────────────┐   ┌────────────┐   │
//! │  │ middleware │ → │ RetryMiddleware │ → │  terminal  │   │
//! │  │  (outer)   │   │                 │   │  handler   │   │
//! │  └────────────┘   └───────┬─────────┘   └────────────┘   │
//! └───────────────────────────┼──────────────────────────────┘
//!                ┌────────────┴────────────┐
//!                ▼                         ▼
//!        ┌──────────────┐          ┌────────────────┐
//!        │ CounterStore │          │ QueueTransport │
//!        │  (attempts)  │          │   (re-enqueue) │
//!        └──────────────┘          └────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use requeue_jobs::prelude::*;
//! use std::sync::Arc;
//!
//! let pool = requeue_jobs::redis::create_pool(&config.redis).await?;
//! let store = Arc::new(RedisCounterStore::new(pool.clone()));
//! let transport = Arc::new(RedisQueueTransport::new(pool, &config.redis));
//!
//! let mut chain = MiddlewareChain::new();
//! chain.set_terminal_handler(handler_fn(|ctx, queue, args| async move {
//!     tracing::info!(attempt = ?ctx.attempt, %queue, "Archiving {:?}", args);
//!     Ok(())
//! }));
//! chain.use_middleware(
//!     RetryMiddleware::from_config("Archive", &config.retry, store, transport)?.into_middleware(),
//! );
//!
//! let registry = JobRegistry::new();
//! registry.register_chain("Archive", &chain)?;
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod handler;
pub mod job;
pub mod memory;
pub mod metrics;
pub mod queue;
pub mod redis;
pub mod registry;
pub mod retry;
pub mod store;

pub use chain::MiddlewareChain;
pub use config::{JobsConfig, RedisConfig, RetryConfig};
pub use error::{JobError, JobResult};
pub use handler::{handler_fn, middleware_fn, Handler, Middleware};
pub use job::{Args, Job, JobContext, JobId, Payload};
pub use memory::{EnqueuedJob, MemoryCounterStore, MemoryQueueTransport};
pub use crate::metrics::{register_metrics, RetryMetrics};
pub use queue::{enqueue, enqueue_in, QueueTransport};
pub use crate::redis::{RedisCounterStore, RedisQueueTransport};
pub use registry::JobRegistry;
pub use retry::{BackoffPolicy, RetryKeyBuilder, RetryMiddleware};
pub use store::{CounterConnection, CounterStore};

/// Re-export commonly used items
pub mod prelude {
    pub use crate::chain::MiddlewareChain;
    pub use crate::handler::{handler_fn, middleware_fn, Handler, Middleware};
    pub use crate::queue::QueueTransport;
    pub use crate::redis::{RedisCounterStore, RedisQueueTransport};
    pub use crate::registry::JobRegistry;
    pub use crate::retry::{BackoffPolicy, RetryMiddleware};
    pub use crate::store::CounterStore;
    pub use crate::{JobContext, JobError, JobResult};
}
