//! Shared error types.

use thiserror::Error;

/// Errors raised by the shared infrastructure of Requeue.
///
/// Job-level failures live in `requeue_jobs::JobError`; this enum only covers
/// concerns that are not tied to a single job execution, such as loading
/// configuration or installing the tracing subscriber.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Telemetry could not be initialized
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Telemetry(_) => "TELEMETRY_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CoreError::configuration("x").error_code(), "CONFIGURATION_ERROR");
        assert_eq!(CoreError::Telemetry("x".into()).error_code(), "TELEMETRY_ERROR");
        assert_eq!(CoreError::internal("x").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_display_includes_message() {
        let err = CoreError::configuration("missing redis url");
        assert_eq!(err.to_string(), "Configuration error: missing redis url");
    }

    #[test]
    fn test_from_anyhow() {
        let err: CoreError = anyhow::anyhow!("boom").into();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_from_config_error() {
        let err: CoreError = config::ConfigError::Message("bad value".into()).into();
        assert!(matches!(err, CoreError::Configuration(msg) if msg.contains("bad value")));
    }
}
