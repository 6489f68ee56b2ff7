//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `AUDIT_ASSISTANT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use audit_assistant::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Model enabled: {}", config.ai.enabled);
//! ```

mod ai;
mod error;
mod logging;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// simulator-only setup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Chat-completions endpoint
    #[serde(default)]
    pub ai: AiConfig,

    /// Tracing output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `AUDIT_ASSISTANT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `AUDIT_ASSISTANT__AI__ENABLED=true` -> `ai.enabled = true`
    /// - `AUDIT_ASSISTANT__LOGGING__LEVEL=debug` -> `logging.level = "debug"`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("AUDIT_ASSISTANT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "AUDIT_ASSISTANT__AI__ENABLED",
        "AUDIT_ASSISTANT__AI__MODEL",
        "AUDIT_ASSISTANT__AI__TEMPERATURE",
        "AUDIT_ASSISTANT__AI__API_KEY",
        "AUDIT_ASSISTANT__LOGGING__LEVEL",
        "AUDIT_ASSISTANT__LOGGING__FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert!(!config.ai.enabled);
        assert_eq!(config.ai.model, "gpt-4");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_nested_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("AUDIT_ASSISTANT__AI__ENABLED", "true");
        env::set_var("AUDIT_ASSISTANT__AI__MODEL", "gpt-4o-mini");
        env::set_var("AUDIT_ASSISTANT__AI__TEMPERATURE", "0.2");
        env::set_var("AUDIT_ASSISTANT__AI__API_KEY", "sk-test");
        env::set_var("AUDIT_ASSISTANT__LOGGING__FORMAT", "json");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.ai.enabled);
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.ai.temperature, 0.2);
        assert!(config.ai.has_api_key());
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validate_loaded_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("AUDIT_ASSISTANT__LOGGING__LEVEL", "debug");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("AUDIT_ASSISTANT__LOGGING__LEVEL", "audit_assistant=loud");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().validate().is_err());
    }
}
