//! Configuration loader with layered sources.

use crate::{CoreError, CoreResult};
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable selecting the environment-specific config file.
pub const ENVIRONMENT_VAR: &str = "REQUEUE_ENVIRONMENT";

/// Layered configuration loader.
///
/// Sources are applied in order, later ones overriding earlier ones:
/// 1. `{config_dir}/default.toml`
/// 2. `{config_dir}/{environment}.toml`
/// 3. `{config_dir}/local.toml` (not committed to version control)
/// 4. Environment variables with the configured prefix, `__` separated
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: String,
    environment: String,
    env_prefix: String,
}

impl ConfigLoader {
    /// Creates a loader reading from `config_dir`.
    ///
    /// The environment name comes from `REQUEUE_ENVIRONMENT`, falling back to
    /// `development`.
    pub fn new(config_dir: impl Into<String>) -> Self {
        let environment =
            std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string());

        Self {
            config_dir: config_dir.into(),
            environment,
            env_prefix: "REQUEUE".to_string(),
        }
    }

    /// Loader for the default location (`./config`).
    pub fn from_default_location() -> Self {
        Self::new("./config")
    }

    /// Overrides the environment name.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Overrides the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Returns the selected environment name.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Loads and deserializes the configuration.
    pub fn load<T: DeserializeOwned>(&self) -> CoreResult<T> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        info!(
            config_dir = %self.config_dir,
            environment = %self.environment,
            "Loading configuration"
        );

        let mut builder = Config::builder();

        for name in ["default", self.environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", self.config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config
            .try_deserialize()
            .map_err(|e| CoreError::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default)]
        name: String,
        #[serde(default)]
        size: u32,
    }

    #[test]
    fn test_missing_directory_yields_defaults() {
        let loader = ConfigLoader::new("/nonexistent/requeue-config")
            .with_environment("test")
            .with_env_prefix("REQUEUE_LOADER_TEST_MISSING");
        let sample: Sample = loader.load().unwrap();
        assert_eq!(sample.name, "");
        assert_eq!(sample.size, 0);
    }

    #[test]
    fn test_environment_file_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "name = \"base\"\nsize = 1\n").unwrap();
        fs::write(dir.path().join("staging.toml"), "size = 5\n").unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy().to_string())
            .with_environment("staging")
            .with_env_prefix("REQUEUE_LOADER_TEST_LAYERED");
        let sample: Sample = loader.load().unwrap();

        assert_eq!(sample.name, "base");
        assert_eq!(sample.size, 5);
        assert_eq!(loader.environment(), "staging");
    }

    #[test]
    fn test_invalid_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "size = \"not a number\"\n").unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy().to_string())
            .with_environment("test")
            .with_env_prefix("REQUEUE_LOADER_TEST_INVALID");
        let err = loader.load::<Sample>().unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }
}
