/// Preset retry policies for the external calls this workspace makes
use crate::retry::RetryConfig;
use std::time::Duration;

/// Remote model inference (text classification over HTTP)
///
/// - Per-attempt timeout: caller supplied (inference latency varies with model size)
/// - Retry: 2 retries, 250ms initial backoff, capped at 5s
pub fn inference_config(attempt_timeout: Duration, max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_backoff: Duration::from_millis(250),
        max_backoff: Duration::from_secs(5),
        backoff_multiplier: 2.0,
        jitter: true,
        attempt_timeout: Some(attempt_timeout),
    }
}

/// Search index writes. Partial document updates are idempotent per id.
pub fn search_write_config() -> RetryConfig {
    RetryConfig {
        max_retries: 1,
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_secs(1),
        backoff_multiplier: 2.0,
        jitter: true,
        attempt_timeout: Some(Duration::from_secs(10)),
    }
}
