//! Job handler registry.
//!
//! Maps job class names to handlers. A registry is an ordinary value created
//! at startup and handed to whatever pulls jobs off the queue; there is no
//! process-wide table.

use crate::chain::MiddlewareChain;
use crate::error::{JobError, JobResult};
use crate::handler::Handler;
use crate::job::Job;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Handlers by job class.
#[derive(Default)]
pub struct JobRegistry {
    handlers: RwLock<HashMap<String, Handler>>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `class`, replacing any previous handler.
    ///
    /// Returns true if a handler was replaced.
    pub fn register(&self, class: impl Into<String>, handler: Handler) -> bool {
        let class = class.into();
        let replaced = self.handlers.write().insert(class.clone(), handler).is_some();

        if replaced {
            warn!(job_class = %class, "Replaced job handler");
        } else {
            info!(job_class = %class, "Registered job handler");
        }

        replaced
    }

    /// Register the composed handler of `chain` for `class`.
    pub fn register_chain(&self, class: impl Into<String>, chain: &MiddlewareChain) -> JobResult<bool> {
        Ok(self.register(class, chain.build()?))
    }

    /// Remove the handler for `class`.
    pub fn unregister(&self, class: &str) -> Option<Handler> {
        self.handlers.write().remove(class)
    }

    /// Handler registered for `class`.
    pub fn get(&self, class: &str) -> Option<Handler> {
        self.handlers.read().get(class).cloned()
    }

    /// Returns true if `class` has a handler.
    pub fn contains(&self, class: &str) -> bool {
        self.handlers.read().contains_key(class)
    }

    /// Registered class names, sorted.
    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self.handlers.read().keys().cloned().collect();
        classes.sort();
        classes
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Run `job` through the handler registered for its class.
    pub async fn dispatch(&self, job: Job) -> JobResult<()> {
        let handler = self
            .get(&job.payload.class)
            .ok_or_else(|| JobError::UnknownJobClass(job.payload.class.clone()))?;

        let ctx = job.context();
        debug!(
            job_id = %ctx.job_id,
            job_class = %job.payload.class,
            queue = %job.queue,
            "Dispatching job"
        );

        handler(ctx, job.queue, job.payload.args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_dispatch_to_registered_handler() {
        let registry = JobRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        registry.register(
            "Resize",
            handler_fn(move |ctx, queue, args| {
                let counter = counter.clone();
                async move {
                    assert_eq!(ctx.class, "Resize");
                    assert_eq!(queue, "images");
                    assert_eq!(args, vec![json!(640)]);
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        );

        registry
            .dispatch(Job::new("images", "Resize", vec![json!(640)]))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_class() {
        let registry = JobRegistry::new();
        let err = registry
            .dispatch(Job::new("default", "Missing", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::UnknownJobClass(class) if class == "Missing"));
    }

    #[test]
    fn test_register_replace_and_unregister() {
        let registry = JobRegistry::new();
        assert!(!registry.register("A", handler_fn(|_, _, _| async { Ok(()) })));
        assert!(registry.register("A", handler_fn(|_, _, _| async { Ok(()) })));
        registry.register("B", handler_fn(|_, _, _| async { Ok(()) }));

        assert_eq!(registry.classes(), vec!["A", "B"]);
        assert!(registry.unregister("A").is_some());
        assert!(!registry.contains("A"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registries_are_independent() {
        let first = JobRegistry::new();
        let second = JobRegistry::new();
        first.register("A", handler_fn(|_, _, _| async { Ok(()) }));
        assert!(second.is_empty());
    }

    #[test]
    fn test_register_chain_without_terminal_fails() {
        let registry = JobRegistry::new();
        let err = registry
            .register_chain("A", &MiddlewareChain::new())
            .unwrap_err();
        assert!(matches!(err, JobError::Configuration(_)));
        assert!(registry.is_empty());
    }
}
