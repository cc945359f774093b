/// Bounded retry with exponential backoff, jitter and a per-attempt timeout
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = fail fast)
    pub max_retries: u32,
    /// Backoff before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any single backoff
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Add random jitter to backoff (±30%)
    pub jitter: bool,
    /// Deadline for each individual attempt; `None` leaves the attempt unbounded
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
            attempt_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl RetryConfig {
    /// Single attempt, no backoff. Still honours `attempt_timeout`.
    pub fn fail_fast(attempt_timeout: Option<Duration>) -> Self {
        Self {
            max_retries: 0,
            attempt_timeout,
            ..Default::default()
        }
    }
}

/// Outcome of one attempt as seen by the retry loop.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError<E> {
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),
    #[error("{0}")]
    Failed(E),
}

impl<E> AttemptError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptError::TimedOut(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: AttemptError<E>,
    },
    #[error("non-retryable failure: {0}")]
    Permanent(E),
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Permanent(_) => 1,
        }
    }
}

/// Run `f` until it succeeds, fails with an error `is_retryable` rejects, or
/// `max_retries` is spent. Timeouts are always retryable.
pub async fn with_retry<F, Fut, T, E, P>(
    config: &RetryConfig,
    is_retryable: P,
    mut f: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt: u32 = 0;
    let mut backoff = config.initial_backoff;

    loop {
        attempt += 1;

        let outcome = match config.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, f()).await {
                Ok(result) => result.map_err(AttemptError::Failed),
                Err(_) => Err(AttemptError::TimedOut(limit)),
            },
            None => f().await.map_err(AttemptError::Failed),
        };

        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(AttemptError::Failed(e)) if !is_retryable(&e) => {
                return Err(RetryError::Permanent(e));
            }
            Err(e) => e,
        };

        if attempt > config.max_retries {
            warn!(attempts = attempt, error = %err, "Retry budget exhausted");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last_error: err,
            });
        }

        let delay = calculate_backoff(backoff, config.jitter);
        warn!(
            attempt,
            max_retries = config.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Attempt failed, retrying"
        );
        tokio::time::sleep(delay).await;

        backoff = Duration::from_millis(
            ((backoff.as_millis() as f64 * config.backoff_multiplier)
                .min(config.max_backoff.as_millis() as f64)) as u64,
        );
    }
}

fn calculate_backoff(base: Duration, jitter: bool) -> Duration {
    if jitter {
        let jitter_factor = 1.0 + rand::thread_rng().gen_range(-0.3..0.3);
        Duration::from_millis((base.as_millis() as f64 * jitter_factor) as u64)
    } else {
        base
    }
}
