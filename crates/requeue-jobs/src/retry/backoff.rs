//! Backoff schedules for failed jobs.

use crate::error::{JobError, JobResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default schedule in seconds: 0s, 1m, 10m, 1h, 3h, 6h.
pub const DEFAULT_BACKOFF_SECS: [u64; 6] = [0, 60, 600, 3600, 10800, 21600];

/// Ordered, non-empty list of retry delays in seconds.
///
/// Lookups past the end repeat the last delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct BackoffPolicy {
    delays_secs: Vec<u64>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            delays_secs: DEFAULT_BACKOFF_SECS.to_vec(),
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy from explicit delays.
    pub fn new(delays_secs: Vec<u64>) -> JobResult<Self> {
        if delays_secs.is_empty() {
            return Err(JobError::Configuration(
                "Backoff schedule must contain at least one delay".to_string(),
            ));
        }
        Ok(Self { delays_secs })
    }

    /// `retries` identical delays.
    pub fn fixed(retries: usize, delay_secs: u64) -> JobResult<Self> {
        Self::new(vec![delay_secs; retries])
    }

    /// Delays growing by `increment_secs` per retry, starting at `increment_secs`.
    pub fn linear(retries: usize, increment_secs: u64) -> JobResult<Self> {
        Self::new(
            (1..=retries as u64)
                .map(|n| increment_secs.saturating_mul(n))
                .collect(),
        )
    }

    /// Exponential growth from `initial_secs`, capped at `max_secs`.
    pub fn exponential(
        retries: usize,
        initial_secs: u64,
        multiplier: f64,
        max_secs: u64,
    ) -> JobResult<Self> {
        let mut delays = Vec::with_capacity(retries);
        let mut current = initial_secs as f64;
        for _ in 0..retries {
            delays.push((current as u64).min(max_secs));
            current *= multiplier;
        }
        Self::new(delays)
    }

    /// Number of configured delays.
    pub fn len(&self) -> usize {
        self.delays_secs.len()
    }

    /// Always false; construction rejects empty schedules.
    pub fn is_empty(&self) -> bool {
        self.delays_secs.is_empty()
    }

    /// Configured delays in seconds.
    pub fn delays_secs(&self) -> &[u64] {
        &self.delays_secs
    }

    /// Retry limit implied by the schedule: one retry per configured delay.
    pub fn default_retry_limit(&self) -> u32 {
        u32::try_from(self.delays_secs.len()).unwrap_or(u32::MAX)
    }

    /// Delay at `index` in seconds, clamped to the last entry.
    pub fn delay_secs(&self, index: usize) -> u64 {
        let last = self.delays_secs.len().saturating_sub(1);
        self.delays_secs
            .get(index.min(last))
            .copied()
            .unwrap_or_default()
    }

    /// Delay at `index`, clamped to the last entry.
    pub fn delay(&self, index: usize) -> Duration {
        Duration::from_secs(self.delay_secs(index))
    }

    /// Delay to wait after the given 1-based attempt failed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.delay((attempt as usize).saturating_sub(1))
    }
}

impl TryFrom<Vec<u64>> for BackoffPolicy {
    type Error = JobError;

    fn try_from(delays_secs: Vec<u64>) -> JobResult<Self> {
        Self::new(delays_secs)
    }
}

impl From<BackoffPolicy> for Vec<u64> {
    fn from(policy: BackoffPolicy) -> Self {
        policy.delays_secs
    }
}
