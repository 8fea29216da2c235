//! Retry handling for failed jobs.

mod backoff;
mod key;
mod middleware;

pub use backoff::{BackoffPolicy, DEFAULT_BACKOFF_SECS};
pub use key::{identifier, RetryKeyBuilder, DEFAULT_KEY_COMPONENT, DEFAULT_KEY_NAMESPACE};
pub use middleware::{RetryMiddleware, ATTEMPT_SENTINEL, DEFAULT_EXPIRY_MARGIN};
