/// Resilience patterns shared by the tweet analysis backend
///
/// - **Retry**: bounded exponential backoff with jitter, a retryable-error
///   predicate and a per-attempt timeout
/// - **Presets**: tuned policies for model inference and search index writes
///
/// # Example
///
/// ```rust,no_run
/// use resilience::{presets, with_retry};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let config = presets::inference_config(Duration::from_secs(5), 2);
///
///     let result = with_retry(&config, |_e: &String| true, || async {
///         // Your model call here
///         Ok::<_, String>("joy")
///     })
///     .await;
/// }
/// ```

pub mod presets;
pub mod retry;

pub use presets::{inference_config, search_write_config};
pub use retry::{with_retry, AttemptError, RetryConfig, RetryError};
