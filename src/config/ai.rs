//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::ai::{OpenAIConfig, DEFAULT_BASE_URL};

/// Chat-completions endpoint configuration
///
/// With `enabled = false` every reply comes from the heuristic simulator.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Whether to query the model at all
    #[serde(default)]
    pub enabled: bool,

    /// Bearer key; omit when the endpoint is a proxy that adds it
    pub api_key: Option<String>,

    /// Endpoint base URL, without `/chat/completions`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name sent with each request
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Builds the adapter configuration for [`OpenAIProvider`](crate::adapters::OpenAIProvider).
    pub fn to_openai_config(&self) -> OpenAIConfig {
        let mut config = OpenAIConfig::new()
            .with_base_url(self.base_url.clone())
            .with_model(self.model.clone())
            .with_timeout(self.timeout())
            .with_max_retries(self.max_retries);
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            config = config.with_api_key(key.clone());
        }
        config
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        if self.enabled {
            if self.base_url.is_empty() {
                return Err(ValidationError::MissingRequired("AI__BASE_URL"));
            }
            if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
                return Err(ValidationError::InvalidBaseUrl);
            }
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    600
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_tokens, 600);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_api_key_counts_as_missing() {
        let config = AiConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = AiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn test_validation_temperature_range() {
        let config = AiConfig {
            temperature: 2.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTemperature));
    }

    #[test]
    fn test_validation_enabled_requires_http_url() {
        let config = AiConfig {
            enabled: true,
            base_url: "localhost:3001".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidBaseUrl));
    }

    #[test]
    fn test_disabled_ignores_base_url() {
        let config = AiConfig {
            enabled: false,
            base_url: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
