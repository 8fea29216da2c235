//! Shared fixtures for retry integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use requeue_jobs::{
    handler_fn, BackoffPolicy, Handler, JobContext, JobError, MemoryCounterStore,
    MemoryQueueTransport, MiddlewareChain, RetryKeyBuilder, RetryMiddleware,
};
use std::collections::VecDeque;
use std::sync::Arc;

/// A chain with a retry middleware over in-memory backends and a terminal
/// handler that succeeds or fails according to a script.
pub struct RetryHarness {
    pub store: MemoryCounterStore,
    pub transport: MemoryQueueTransport,
    pub handler: Handler,
    script: Arc<Mutex<VecDeque<bool>>>,
    attempts: Arc<Mutex<Vec<Option<u32>>>>,
}

impl RetryHarness {
    /// Build a harness with `retry_limit` and `delays` (seconds).
    pub fn new(retry_limit: u32, delays: Vec<u64>) -> Self {
        let store = MemoryCounterStore::new();
        let transport = MemoryQueueTransport::new();
        let policy = BackoffPolicy::new(delays).expect("valid schedule");
        let middleware = RetryMiddleware::new(
            retry_limit,
            "Archive",
            policy,
            Arc::new(store.clone()),
            Arc::new(transport.clone()),
        )
        .expect("valid retry limit");

        let script: Arc<Mutex<VecDeque<bool>>> = Arc::default();
        let attempts: Arc<Mutex<Vec<Option<u32>>>> = Arc::default();

        let terminal = {
            let script = script.clone();
            let attempts = attempts.clone();
            handler_fn(move |ctx: JobContext, _, _| {
                let script = script.clone();
                let attempts = attempts.clone();
                async move {
                    attempts.lock().push(ctx.attempt);
                    if script.lock().pop_front().unwrap_or(true) {
                        Ok(())
                    } else {
                        Err(JobError::failed("scripted failure"))
                    }
                }
            })
        };

        let mut chain = MiddlewareChain::new();
        chain.set_terminal_handler(terminal);
        chain.use_middleware(middleware.into_middleware());

        Self {
            store,
            transport,
            handler: chain.build().expect("terminal handler set"),
            script,
            attempts,
        }
    }

    /// Queue up outcomes for the next runs: `true` succeeds, `false` fails.
    pub fn script(&self, outcomes: &[bool]) {
        self.script.lock().extend(outcomes.iter().copied());
    }

    /// Counter key the middleware uses for a job on `queue` with `args`.
    pub fn retry_key(&self, queue: &str, args: &[serde_json::Value]) -> String {
        RetryKeyBuilder::default().key(queue, args)
    }

    /// Attempt numbers observed by the terminal handler.
    pub fn attempts(&self) -> Vec<Option<u32>> {
        self.attempts.lock().clone()
    }

    /// Run the composed handler once.
    pub async fn run(&self, queue: &str, args: Vec<serde_json::Value>) -> Result<(), JobError> {
        (self.handler)(JobContext::new("Archive"), queue.to_string(), args).await
    }
}
