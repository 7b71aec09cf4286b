use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Initial delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries (before jitter)
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (e.g., 2.0 doubles the delay each time)
    pub backoff_multiplier: f64,
    /// Upper bound of the random jitter added to every retry delay
    pub max_jitter: Duration,
}

impl RetryConfig {
    /// Create a new retry configuration
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            max_jitter: Duration::ZERO,
        }
    }

    /// Set the maximum delay between retries
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set the maximum random jitter added to each delay
    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Preset: translation API calls (3 attempts)
    /// Delays: 200ms, 400ms (capped at 1s), each plus 0-100ms jitter
    pub fn translation() -> Self {
        Self::new(3, Duration::from_millis(200))
            .with_max_delay(Duration::from_millis(1000))
            .with_backoff_multiplier(2.0)
            .with_jitter(Duration::from_millis(100))
    }

    /// Calculate the base delay for a given attempt number (0-indexed), without jitter
    pub(crate) fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::translation()
    }
}

/// Progress of one retried operation.
#[derive(Debug)]
pub struct RetryState<E> {
    /// Attempts made so far
    pub attempt: u32,
    /// Error returned by the most recent failed attempt
    pub last_error: Option<E>,
}

impl<E> RetryState<E> {
    fn new() -> Self {
        Self {
            attempt: 0,
            last_error: None,
        }
    }
}

/// Final error of a retried operation, with the number of attempts made.
#[derive(Debug)]
pub struct RetryFailure<E> {
    pub attempts: u32,
    pub error: E,
}

/// Execute an async operation with retries, using a predicate to determine if retry is appropriate
///
/// Some errors (like 4xx client errors) should not be retried, while others (5xx, network) should.
///
/// # Arguments
/// * `config` - Retry configuration (a `max_attempts` of 0 still runs once)
/// * `operation_name` - Name of the operation for logging
/// * `operation` - Async closure that returns Result<T, E>
/// * `should_retry` - Predicate deciding whether an error is worth another attempt
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut state: RetryState<E> = RetryState::new();

    loop {
        // Wait before retry (except for first attempt)
        let delay = config.delay_for_attempt(state.attempt);
        if !delay.is_zero() {
            let delay = delay + config.jitter();
            debug!(
                "{}: Retry attempt {}/{} after {:?}",
                operation_name,
                state.attempt + 1,
                max_attempts,
                delay
            );
            sleep(delay).await;
        }

        state.attempt += 1;

        match operation().await {
            Ok(result) => {
                if let Some(previous) = &state.last_error {
                    debug!(
                        "{}: Succeeded on attempt {}/{} (previous error: {})",
                        operation_name, state.attempt, max_attempts, previous
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                // Check if we should retry this error
                if !should_retry(&e) {
                    debug!(
                        "{}: Error is not retryable, failing immediately: {}",
                        operation_name, e
                    );
                    return Err(RetryFailure {
                        attempts: state.attempt,
                        error: e,
                    });
                }

                let remaining = max_attempts - state.attempt;
                if remaining == 0 {
                    warn!(
                        "{}: All {} attempts failed. Last error: {}",
                        operation_name, max_attempts, e
                    );
                    return Err(RetryFailure {
                        attempts: state.attempt,
                        error: e,
                    });
                }

                warn!(
                    "{}: Attempt {}/{} failed ({}), {} retries remaining",
                    operation_name, state.attempt, max_attempts, e, remaining
                );
                state.last_error = Some(e);
            }
        }
    }
}
