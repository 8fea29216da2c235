//! Queue transport abstraction.

use crate::error::JobResult;
use crate::job::Job;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Durable queue used to (re-)schedule jobs.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Push a job for `class` onto `queue` for immediate processing.
    async fn enqueue_now(&self, queue: &str, class: &str, args: &[Value]) -> JobResult<()>;

    /// Schedule a job for `class` on `queue` to become available after `delay`.
    async fn enqueue_after(
        &self,
        delay: Duration,
        queue: &str,
        class: &str,
        args: &[Value],
    ) -> JobResult<()>;
}

/// Enqueue a job through any transport.
pub async fn enqueue<T: QueueTransport + ?Sized>(transport: &T, job: &Job) -> JobResult<()> {
    transport
        .enqueue_now(&job.queue, &job.payload.class, &job.payload.args)
        .await
}

/// Enqueue a job through any transport after `delay`.
///
/// A zero delay enqueues immediately.
pub async fn enqueue_in<T: QueueTransport + ?Sized>(
    transport: &T,
    delay: Duration,
    job: &Job,
) -> JobResult<()> {
    if delay.is_zero() {
        return enqueue(transport, job).await;
    }

    transport
        .enqueue_after(delay, &job.queue, &job.payload.class, &job.payload.args)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryQueueTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_enqueue_uses_job_fields() {
        let transport = MemoryQueueTransport::new();
        let job = Job::new("reports", "BuildReport", vec![json!({"id": 7})]);

        enqueue(&transport, &job).await.unwrap();

        let sent = transport.enqueued();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].queue, "reports");
        assert_eq!(sent[0].class, "BuildReport");
        assert_eq!(sent[0].args, vec![json!({"id": 7})]);
        assert_eq!(sent[0].delay, None);
    }

    #[tokio::test]
    async fn test_enqueue_in_zero_delay_is_immediate() {
        let transport = MemoryQueueTransport::new();
        let job = Job::new("reports", "BuildReport", vec![]);

        enqueue_in(&transport, Duration::ZERO, &job).await.unwrap();
        enqueue_in(&transport, Duration::from_secs(30), &job).await.unwrap();

        let sent = transport.enqueued();
        assert_eq!(sent[0].delay, None);
        assert_eq!(sent[1].delay, Some(Duration::from_secs(30)));
    }
}
