//! Configuration for the tweet analysis service
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Largest page the search index serves without scrolling (`index.max_result_window`).
pub const INDEX_RESULT_WINDOW: u32 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct, loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    // ============================================
    // Search index
    // ============================================
    /// Search index URL
    #[serde(default = "default_es_host")]
    pub es_host: String,

    /// Name of the index holding Post documents
    #[serde(default = "default_es_index")]
    pub es_index: String,

    #[serde(default)]
    pub es_user: Option<String>,

    #[serde(default)]
    pub es_password: Option<String>,

    #[serde(default = "default_true")]
    pub es_verify_certs: bool,

    // ============================================
    // Limit policy
    // ============================================
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default = "default_max_limit")]
    pub max_limit: u32,

    // ============================================
    // Emotion model
    // ============================================
    /// Text-classification endpoint (Hugging Face compatible)
    #[serde(default = "default_classifier_url")]
    pub classifier_url: String,

    #[serde(default)]
    pub classifier_api_token: Option<String>,

    /// Per-attempt deadline for a model call
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,

    #[serde(default = "default_classifier_max_retries")]
    pub classifier_max_retries: u32,

    /// Posts classified concurrently within one pipeline run
    #[serde(default = "default_classification_concurrency")]
    pub classification_concurrency: usize,

    // ============================================
    // Ingestion
    // ============================================
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,

    /// Load the dataset when the index is created at startup
    #[serde(default = "default_true")]
    pub seed_on_index_create: bool,

    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_es_host() -> String {
    "http://localhost:9200".to_string()
}

fn default_es_index() -> String {
    "tweets".to_string()
}

fn default_true() -> bool {
    true
}

fn default_limit() -> u32 {
    100
}

fn default_max_limit() -> u32 {
    1000
}

fn default_classifier_url() -> String {
    "http://localhost:8080/predict".to_string()
}

fn default_classifier_timeout_ms() -> u64 {
    30_000
}

fn default_classifier_max_retries() -> u32 {
    2
}

fn default_classification_concurrency() -> usize {
    4
}

fn default_dataset_path() -> String {
    "tweets_dataset.json".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Config = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit set of variables (uppercase names, as in the environment)
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_limit == 0 || self.max_limit > INDEX_RESULT_WINDOW {
            return Err(ConfigError::Invalid(format!(
                "MAX_LIMIT must be between 1 and {}, got {}",
                INDEX_RESULT_WINDOW, self.max_limit
            )));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid(format!(
                "DEFAULT_LIMIT must be between 1 and MAX_LIMIT ({}), got {}",
                self.max_limit, self.default_limit
            )));
        }
        if self.classification_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "CLASSIFICATION_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if self.classifier_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "CLASSIFIER_TIMEOUT_MS must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }

    /// Basic auth is enabled only when both halves are present.
    pub fn es_credentials(&self) -> Option<(&str, &str)> {
        match (self.es_user.as_deref(), self.es_password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some((user, password))
            }
            _ => None,
        }
    }
}
