use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::WatcherError;
use crate::logging::{ErrorLogger, LogContext, PerformanceMonitor};

/// Fixed-delay retry policy
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Pause between two attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(2))
    }
}

impl RetryConfig {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

/// Result of running an operation under a retry policy
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// The operation succeeded on attempt `attempts`
    Success { value: T, attempts: u32 },
    /// Every attempt failed with a recoverable error
    Exhausted { last_error: WatcherError, attempts: u32 },
    /// A non-recoverable error stopped retrying early
    Aborted { error: WatcherError, attempts: u32 },
}

impl<T> RetryOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Success { attempts, .. }
            | RetryOutcome::Exhausted { attempts, .. }
            | RetryOutcome::Aborted { attempts, .. } => *attempts,
        }
    }

    /// The value on success, `None` otherwise
    pub fn ok(self) -> Option<T> {
        match self {
            RetryOutcome::Success { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Runs async operations with bounded retries
pub struct RetryManager {
    config: RetryConfig,
    operation_name: String,
}

impl RetryManager {
    pub fn new(operation_name: &str, config: RetryConfig) -> Self {
        Self {
            config,
            operation_name: operation_name.to_string(),
        }
    }

    /// Execute an operation with retry logic
    pub async fn execute<T, F, Fut>(&self, operation: F) -> RetryOutcome<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, WatcherError>>,
    {
        let monitor = PerformanceMonitor::new(&format!("retry_{}", self.operation_name));
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        ErrorLogger::log_recovery_success(&self.operation_name, attempt, monitor.elapsed_ms());
                    }
                    return RetryOutcome::Success { value, attempts: attempt };
                }
                Err(error) => {
                    if !error.is_recoverable() {
                        LogContext::new("retry", &self.operation_name)
                            .with_retry_count(attempt)
                            .with_error_code(error.code())
                            .error(&format!("Non-recoverable error, aborting retries: {}", error));
                        return RetryOutcome::Aborted { error, attempts: attempt };
                    }

                    ErrorLogger::log_retry_attempt(&self.operation_name, &error, attempt, max_attempts);

                    if attempt >= max_attempts {
                        return RetryOutcome::Exhausted { last_error: error, attempts: attempt };
                    }

                    let delay = self.config.delay;
                    LogContext::new("retry", &self.operation_name)
                        .with_retry_count(attempt)
                        .with_metadata("delay_ms", serde_json::json!(delay.as_millis() as u64))
                        .debug(&format!("Retrying in {}ms", delay.as_millis()));

                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, RpcError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig::fixed(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.delay, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let manager = RetryManager::new("test_operation", fast_config(3));

        let outcome = manager.execute(|| async { Ok::<i32, WatcherError>(42) }).await;

        assert!(matches!(outcome, RetryOutcome::Success { attempts: 1, .. }));
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(outcome.ok(), Some(42));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let manager = RetryManager::new("flaky", fast_config(3));
        let calls = AtomicU32::new(0);

        let outcome = manager
            .execute(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(WatcherError::Rpc(RpcError::Connection("refused".to_string())))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(outcome.attempts(), 3);
        assert_eq!(outcome.ok(), Some(7));
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let manager = RetryManager::new("always_failing", fast_config(3));
        let calls = AtomicU32::new(0);

        let outcome = manager
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(WatcherError::Rpc(RpcError::Timeout { seconds: 1 }))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(outcome, RetryOutcome::Exhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_non_recoverable_error_aborts() {
        let manager = RetryManager::new("config", fast_config(3));
        let calls = AtomicU32::new(0);

        let outcome = manager
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(WatcherError::Config(ConfigError::MissingEnvVar("TEST".to_string())))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(outcome, RetryOutcome::Aborted { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn test_waits_fixed_delay_between_attempts() {
        let manager = RetryManager::new("paced", RetryConfig::fixed(3, Duration::from_millis(20)));
        let started = std::time::Instant::now();
        let calls = AtomicU32::new(0);

        let outcome = manager
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(WatcherError::Rpc(RpcError::Timeout { seconds: 1 }))
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Exhausted { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // two pauses, none after the last attempt
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(40), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(2), "elapsed {:?}", elapsed);
    }
}
