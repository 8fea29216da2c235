//! Job payloads and execution context.

use crate::error::JobResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Ordered job arguments as carried on the wire.
pub type Args = Vec<Value>;

/// Unique identifier of one job execution, used to correlate log events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Creates a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the job ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job execution context.
///
/// Passed by value down the middleware chain. Middlewares that want to tell
/// inner layers something return an overlaid copy instead of mutating shared
/// state.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Execution ID.
    pub job_id: JobId,

    /// Job class being executed.
    pub class: String,

    /// Retry attempt number (1-based), set by the retry middleware.
    pub attempt: Option<u32>,

    /// Job started executing at this time.
    pub started_at: DateTime<Utc>,

    /// Correlation ID for tracing.
    pub correlation_id: Option<String>,

    /// Worker processing this job.
    pub worker_id: Option<String>,
}

impl JobContext {
    /// Creates a context for executing a job of the given class.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            job_id: JobId::new(),
            class: class.into(),
            attempt: None,
            started_at: Utc::now(),
            correlation_id: None,
            worker_id: None,
        }
    }

    /// Returns a copy carrying the given attempt number.
    #[must_use]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Returns a copy carrying the given worker ID.
    #[must_use]
    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = Some(worker_id.into());
        self
    }

    /// Returns a copy carrying the given correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Returns true if this execution is a re-run of an earlier failure.
    pub fn is_retry(&self) -> bool {
        self.attempt.map_or(false, |attempt| attempt > 1)
    }
}

/// Resque job payload: the class to run and its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Job class name.
    pub class: String,

    /// Ordered arguments.
    #[serde(default)]
    pub args: Args,
}

/// A job addressed to a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Queue name.
    pub queue: String,

    /// Payload pushed onto the queue.
    pub payload: Payload,
}

impl Job {
    /// Creates a job for `class` on `queue`.
    pub fn new(queue: impl Into<String>, class: impl Into<String>, args: Args) -> Self {
        Self {
            queue: queue.into(),
            payload: Payload {
                class: class.into(),
                args,
            },
        }
    }

    /// Serialize the payload to JSON.
    pub fn payload_json(&self) -> JobResult<String> {
        Ok(serde_json::to_string(&self.payload)?)
    }

    /// Deserialize a payload popped from `queue`.
    pub fn from_payload_json(queue: impl Into<String>, json: &str) -> JobResult<Self> {
        Ok(Self {
            queue: queue.into(),
            payload: serde_json::from_str(json)?,
        })
    }

    /// Builds the execution context for this job.
    pub fn context(&self) -> JobContext {
        JobContext::new(&self.payload.class)
    }
}
