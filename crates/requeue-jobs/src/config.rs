//! Job client configuration.

use crate::error::{JobError, JobResult};
use crate::retry::{
    BackoffPolicy, RetryKeyBuilder, DEFAULT_BACKOFF_SECS, DEFAULT_KEY_COMPONENT,
    DEFAULT_KEY_NAMESPACE,
};
use requeue_core::{ConfigLoader, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the job client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Redis connection configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Retry middleware configuration.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Tracing output configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl JobsConfig {
    /// Load from layered sources and validate.
    pub fn load(loader: &ConfigLoader) -> JobResult<Self> {
        let config: Self = loader.load()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> JobResult<()> {
        if self.redis.url.is_empty() {
            return Err(JobError::Configuration("Redis URL is required".to_string()));
        }
        if self.redis.pool_size == 0 {
            return Err(JobError::Configuration(
                "Redis pool size must be at least 1".to_string(),
            ));
        }
        if self.retry.backoff_secs.is_empty() {
            return Err(JobError::Configuration(
                "Backoff schedule must contain at least one delay".to_string(),
            ));
        }
        if self.retry.retry_limit == Some(0) {
            return Err(JobError::Configuration(
                "Retry limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL.
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Prefix for queue keys, including the trailing separator.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_pool_size(),
            connect_timeout_secs: default_connect_timeout(),
            namespace: default_namespace(),
        }
    }
}

impl RedisConfig {
    /// Returns connect timeout as Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_pool_size() -> usize {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_namespace() -> String {
    "resque:".to_string()
}

/// Retry middleware configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay before each retry, in seconds.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: Vec<u64>,

    /// Maximum attempts; defaults to the length of `backoff_secs`.
    #[serde(default)]
    pub retry_limit: Option<u32>,

    /// Extra counter lifetime past the next retry, in seconds.
    #[serde(default = "default_expiry_margin")]
    pub expiry_margin_secs: u64,

    /// First segment of retry keys.
    #[serde(default = "default_key_namespace")]
    pub key_namespace: String,

    /// Second segment of retry keys.
    #[serde(default = "default_key_component")]
    pub key_component: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_secs: default_backoff_secs(),
            retry_limit: None,
            expiry_margin_secs: default_expiry_margin(),
            key_namespace: default_key_namespace(),
            key_component: default_key_component(),
        }
    }
}

impl RetryConfig {
    /// Backoff policy built from `backoff_secs`.
    pub fn policy(&self) -> JobResult<BackoffPolicy> {
        BackoffPolicy::new(self.backoff_secs.clone())
    }

    /// Retry key builder using the configured prefix.
    pub fn key_builder(&self) -> RetryKeyBuilder {
        RetryKeyBuilder::new(&self.key_namespace, &self.key_component)
    }

    /// Returns expiry margin as Duration.
    pub fn expiry_margin(&self) -> Duration {
        Duration::from_secs(self.expiry_margin_secs)
    }
}

fn default_backoff_secs() -> Vec<u64> {
    DEFAULT_BACKOFF_SECS.to_vec()
}

fn default_expiry_margin() -> u64 {
    3600 // 1 hour
}

fn default_key_namespace() -> String {
    DEFAULT_KEY_NAMESPACE.to_string()
}

fn default_key_component() -> String {
    DEFAULT_KEY_COMPONENT.to_string()
}
