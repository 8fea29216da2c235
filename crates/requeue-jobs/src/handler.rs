//! Handler and middleware function types.

use crate::error::JobResult;
use crate::job::{Args, JobContext};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

/// Job handler: receives the execution context, the queue name and the
/// ordered job arguments.
pub type Handler =
    Arc<dyn Fn(JobContext, String, Args) -> BoxFuture<'static, JobResult<()>> + Send + Sync>;

/// Wraps a handler into a new handler with the same signature.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Adapts an async closure into a [`Handler`].
///
/// ```rust,ignore
/// let handler = handler_fn(|ctx, queue, args| async move {
///     tracing::info!(class = %ctx.class, %queue, args = args.len(), "Running job");
///     Ok(())
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(JobContext, String, Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JobResult<()>> + Send + 'static,
{
    Arc::new(move |ctx: JobContext, queue: String, args: Args| f(ctx, queue, args).boxed())
}

/// Adapts a closure into a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}
