//! Prometheus-style metrics for retry handling.
//!
//! The retry middleware reports "gave up" as success to its caller, so these
//! counters are the place where permanently abandoned jobs show up.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Metric names for the retry layer.
pub mod names {
    /// Attempts started by the retry middleware.
    pub const RETRY_ATTEMPTS_TOTAL: &str = "requeue_retry_attempts_total";
    /// Attempts whose inner handler succeeded.
    pub const RETRY_SUCCEEDED_TOTAL: &str = "requeue_retry_succeeded_total";
    /// Failed attempts re-enqueued for another run.
    pub const RETRY_SCHEDULED_TOTAL: &str = "requeue_retry_scheduled_total";
    /// Jobs abandoned after reaching the retry limit.
    pub const RETRY_EXHAUSTED_TOTAL: &str = "requeue_retry_exhausted_total";
    /// Re-enqueue calls rejected by the queue transport.
    pub const RETRY_TRANSPORT_ERRORS_TOTAL: &str = "requeue_retry_transport_errors_total";
    /// Counter store failures while tracking attempts.
    pub const RETRY_STORE_ERRORS_TOTAL: &str = "requeue_retry_store_errors_total";

    /// Backoff delay applied to scheduled retries, in seconds.
    pub const RETRY_DELAY_SECONDS: &str = "requeue_retry_delay_seconds";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::RETRY_ATTEMPTS_TOTAL,
        "Total number of attempts started by the retry middleware"
    );
    describe_counter!(
        names::RETRY_SUCCEEDED_TOTAL,
        "Total number of attempts that succeeded"
    );
    describe_counter!(
        names::RETRY_SCHEDULED_TOTAL,
        "Total number of failed attempts re-enqueued"
    );
    describe_counter!(
        names::RETRY_EXHAUSTED_TOTAL,
        "Total number of jobs abandoned after exhausting retries"
    );
    describe_counter!(
        names::RETRY_TRANSPORT_ERRORS_TOTAL,
        "Total number of failed re-enqueue calls"
    );
    describe_counter!(
        names::RETRY_STORE_ERRORS_TOTAL,
        "Total number of retry counter store failures"
    );
    describe_histogram!(
        names::RETRY_DELAY_SECONDS,
        "Backoff delay applied to scheduled retries in seconds"
    );
}

/// Retry metrics recorder.
#[derive(Clone)]
pub struct RetryMetrics;

impl RetryMetrics {
    /// Record an attempt starting.
    pub fn attempt_started(queue: &str, job_class: &str, attempt: u32) {
        counter!(
            names::RETRY_ATTEMPTS_TOTAL,
            "queue" => queue.to_string(),
            "job_class" => job_class.to_string(),
            "attempt" => attempt.to_string()
        )
        .increment(1);
    }

    /// Record a successful attempt.
    pub fn succeeded(queue: &str, job_class: &str) {
        counter!(
            names::RETRY_SUCCEEDED_TOTAL,
            "queue" => queue.to_string(),
            "job_class" => job_class.to_string()
        )
        .increment(1);
    }

    /// Record a retry being scheduled.
    pub fn scheduled(queue: &str, job_class: &str, delay: Duration) {
        let mode = if delay.is_zero() { "immediate" } else { "delayed" };

        counter!(
            names::RETRY_SCHEDULED_TOTAL,
            "queue" => queue.to_string(),
            "job_class" => job_class.to_string(),
            "mode" => mode
        )
        .increment(1);

        histogram!(
            names::RETRY_DELAY_SECONDS,
            "queue" => queue.to_string(),
            "job_class" => job_class.to_string()
        )
        .record(delay.as_secs_f64());
    }

    /// Record a job abandoned after its last allowed attempt.
    pub fn exhausted(queue: &str, job_class: &str) {
        counter!(
            names::RETRY_EXHAUSTED_TOTAL,
            "queue" => queue.to_string(),
            "job_class" => job_class.to_string()
        )
        .increment(1);
    }

    /// Record a failed re-enqueue.
    pub fn transport_error(queue: &str, job_class: &str) {
        counter!(
            names::RETRY_TRANSPORT_ERRORS_TOTAL,
            "queue" => queue.to_string(),
            "job_class" => job_class.to_string()
        )
        .increment(1);
    }

    /// Record a counter store failure.
    pub fn store_error(operation: &'static str) {
        counter!(
            names::RETRY_STORE_ERRORS_TOTAL,
            "operation" => operation
        )
        .increment(1);
    }
}
