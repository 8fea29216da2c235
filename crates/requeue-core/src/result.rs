//! Result type aliases for Requeue.

use crate::CoreError;

/// A specialized `Result` type for shared infrastructure operations.
pub type CoreResult<T> = Result<T, CoreError>;
