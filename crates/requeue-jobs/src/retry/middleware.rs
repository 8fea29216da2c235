//! Retry middleware.
//!
//! Each invocation bumps an attempt counter shared through the counter store,
//! runs the inner handler with the attempt number attached to the context,
//! and on failure either re-enqueues the job according to the backoff policy
//! or gives up once the retry limit is reached.

use super::backoff::BackoffPolicy;
use super::key::RetryKeyBuilder;
use crate::config::RetryConfig;
use crate::error::{JobError, JobResult};
use crate::handler::{handler_fn, middleware_fn, Handler, Middleware};
use crate::job::{Args, JobContext};
use crate::metrics::RetryMetrics;
use crate::queue::QueueTransport;
use crate::store::{CounterConnection, CounterStore};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Counter value meaning "no attempt started yet".
pub const ATTEMPT_SENTINEL: i64 = 0;

/// Extra lifetime given to a counter beyond the next scheduled retry, so it
/// survives until that retry is actually picked up.
pub const DEFAULT_EXPIRY_MARGIN: Duration = Duration::from_secs(3600);

/// Middleware that re-enqueues failed jobs with backoff.
pub struct RetryMiddleware<S, T> {
    retry_limit: u32,
    job_class: String,
    policy: BackoffPolicy,
    keys: RetryKeyBuilder,
    expiry_margin: Duration,
    store: Arc<S>,
    transport: Arc<T>,
}

impl<S, T> RetryMiddleware<S, T>
where
    S: CounterStore + 'static,
    T: QueueTransport + 'static,
{
    /// Create a retry middleware.
    ///
    /// Failed jobs are re-enqueued as `job_class` until `retry_limit` attempts
    /// have run.
    pub fn new(
        retry_limit: u32,
        job_class: impl Into<String>,
        policy: BackoffPolicy,
        store: Arc<S>,
        transport: Arc<T>,
    ) -> JobResult<Self> {
        if retry_limit == 0 {
            return Err(JobError::Configuration(
                "Retry limit must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            retry_limit,
            job_class: job_class.into(),
            policy,
            keys: RetryKeyBuilder::default(),
            expiry_margin: DEFAULT_EXPIRY_MARGIN,
            store,
            transport,
        })
    }

    /// Create a retry middleware whose limit is the length of `policy`.
    pub fn with_policy(
        job_class: impl Into<String>,
        policy: BackoffPolicy,
        store: Arc<S>,
        transport: Arc<T>,
    ) -> Self {
        Self {
            retry_limit: policy.default_retry_limit(),
            job_class: job_class.into(),
            policy,
            keys: RetryKeyBuilder::default(),
            expiry_margin: DEFAULT_EXPIRY_MARGIN,
            store,
            transport,
        }
    }

    /// Create a retry middleware from configuration.
    pub fn from_config(
        job_class: impl Into<String>,
        config: &RetryConfig,
        store: Arc<S>,
        transport: Arc<T>,
    ) -> JobResult<Self> {
        let policy = config.policy()?;
        let retry_limit = config
            .retry_limit
            .unwrap_or_else(|| policy.default_retry_limit());

        Ok(Self::new(retry_limit, job_class, policy, store, transport)?
            .with_key_builder(config.key_builder())
            .with_expiry_margin(config.expiry_margin()))
    }

    /// Override the retry key prefix.
    #[must_use]
    pub fn with_key_builder(mut self, keys: RetryKeyBuilder) -> Self {
        self.keys = keys;
        self
    }

    /// Override the counter expiry margin.
    #[must_use]
    pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
        self.expiry_margin = margin;
        self
    }

    /// Maximum number of attempts.
    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Job class used when re-enqueueing.
    pub fn job_class(&self) -> &str {
        &self.job_class
    }

    /// Backoff schedule.
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Retry key for a job on `queue` with `args`.
    pub fn retry_key(&self, queue: &str, args: &[serde_json::Value]) -> String {
        self.keys.key(queue, args)
    }

    /// Run one attempt of `next` under retry control.
    ///
    /// Returns `Ok(())` once the outcome is settled, including when the job
    /// failed for the last time and was dropped. Only counter store and queue
    /// transport failures are returned as errors.
    pub async fn call(
        &self,
        next: &Handler,
        ctx: JobContext,
        queue: String,
        args: Args,
    ) -> JobResult<()> {
        let retry_key = self.retry_key(&queue, &args);

        let attempt = self.begin_attempt(&retry_key).await.map_err(|e| {
            RetryMetrics::store_error("begin_attempt");
            error!(retry_key = %retry_key, error = %e, "Failed to begin retry attempt");
            e
        })?;
        RetryMetrics::attempt_started(&queue, &self.job_class, attempt);

        let outcome = next(ctx.with_attempt(attempt), queue.clone(), args.clone()).await;

        let failure = match outcome {
            Ok(()) => {
                self.clear(&retry_key).await?;
                RetryMetrics::succeeded(&queue, &self.job_class);
                debug!(queue = %queue, job_class = %self.job_class, attempt, "Job succeeded");
                return Ok(());
            }
            Err(e) => e,
        };

        if attempt >= self.retry_limit {
            self.clear(&retry_key).await?;
            RetryMetrics::exhausted(&queue, &self.job_class);
            warn!(
                queue = %queue,
                job_class = %self.job_class,
                attempt,
                retry_limit = self.retry_limit,
                error = %failure,
                "Retry limit reached, giving up on job"
            );
            return Ok(());
        }

        let delay = self.policy.delay_for_attempt(attempt);
        let enqueued = if delay.is_zero() {
            self.transport
                .enqueue_now(&queue, &self.job_class, &args)
                .await
        } else {
            self.transport
                .enqueue_after(delay, &queue, &self.job_class, &args)
                .await
        };

        if let Err(e) = enqueued {
            RetryMetrics::transport_error(&queue, &self.job_class);
            error!(
                queue = %queue,
                job_class = %self.job_class,
                attempt,
                error = %e,
                "Failed to re-enqueue job"
            );
            return Err(e);
        }

        RetryMetrics::scheduled(&queue, &self.job_class, delay);
        info!(
            queue = %queue,
            job_class = %self.job_class,
            attempt,
            delay_secs = delay.as_secs(),
            error = %failure,
            "Job failed, retry scheduled"
        );

        Ok(())
    }

    /// Wrap this middleware for use in a [`MiddlewareChain`](crate::MiddlewareChain).
    pub fn into_middleware(self) -> Middleware {
        let this = Arc::new(self);
        middleware_fn(move |next: Handler| {
            let this = this.clone();
            handler_fn(move |ctx, queue, args| {
                let this = this.clone();
                let next = next.clone();
                async move { this.call(&next, ctx, queue, args).await }
            })
        })
    }

    async fn begin_attempt(&self, retry_key: &str) -> JobResult<u32> {
        let mut conn = self.store.acquire().await?;

        conn.create_if_absent(retry_key, ATTEMPT_SENTINEL).await?;
        let counter = conn.increment(retry_key).await?;
        let attempt = u32::try_from(counter)
            .ok()
            .filter(|attempt| *attempt > 0)
            .ok_or_else(|| {
                JobError::Store(format!(
                    "Retry counter {} holds invalid attempt {}",
                    retry_key, counter
                ))
            })?;

        let ttl = self
            .policy
            .delay_for_attempt(attempt)
            .saturating_add(self.expiry_margin);
        conn.set_expiry(retry_key, ttl.as_secs()).await?;

        debug!(retry_key = %retry_key, attempt, ttl_secs = ttl.as_secs(), "Began retry attempt");

        Ok(attempt)
    }

    async fn clear(&self, retry_key: &str) -> JobResult<()> {
        let mut conn = self.store.acquire().await.map_err(|e| {
            RetryMetrics::store_error("clear");
            e
        })?;
        conn.delete(retry_key).await.map_err(|e| {
            RetryMetrics::store_error("clear");
            e
        })
    }
}

impl<S, T> fmt::Debug for RetryMiddleware<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryMiddleware")
            .field("retry_limit", &self.retry_limit)
            .field("job_class", &self.job_class)
            .field("policy", &self.policy)
            .field("keys", &self.keys)
            .field("expiry_margin", &self.expiry_margin)
            .finish_non_exhaustive()
    }
}
