use log::{debug, error, info, trace, warn};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ErrorSeverity, WatcherError};

/// Structured logging context for the watcher
pub struct LogContext {
    pub component: String,
    pub operation: String,
    pub metadata: HashMap<String, Value>,
}

impl LogContext {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn with_block_height(self, height: u64) -> Self {
        self.with_metadata("block_height", json!(height))
    }

    pub fn with_transaction_hash(self, tx_hash: &str) -> Self {
        self.with_metadata("transaction_hash", json!(tx_hash))
    }

    pub fn with_amount(self, amount: &str) -> Self {
        self.with_metadata("amount", json!(amount))
    }

    pub fn with_duration_ms(self, duration_ms: u64) -> Self {
        self.with_metadata("duration_ms", json!(duration_ms))
    }

    pub fn with_retry_count(self, retry_count: u32) -> Self {
        self.with_metadata("retry_count", json!(retry_count))
    }

    pub fn with_error_code(self, error_code: &str) -> Self {
        self.with_metadata("error_code", json!(error_code))
    }

    fn format_message(&self, level: &str, message: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut log_entry = json!({
            "timestamp": timestamp,
            "level": level,
            "component": self.component,
            "operation": self.operation,
            "message": message,
        });

        for (key, value) in &self.metadata {
            log_entry[key] = value.clone();
        }

        log_entry.to_string()
    }

    pub fn info(&self, message: &str) {
        info!("{}", self.format_message("INFO", message));
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", self.format_message("WARN", message));
    }

    pub fn error(&self, message: &str) {
        error!("{}", self.format_message("ERROR", message));
    }

    pub fn debug(&self, message: &str) {
        debug!("{}", self.format_message("DEBUG", message));
    }

    pub fn trace(&self, message: &str) {
        trace!("{}", self.format_message("TRACE", message));
    }
}

/// Measures how long an operation took and logs it on completion
pub struct PerformanceMonitor {
    pub start_time: SystemTime,
    operation: String,
    metadata: HashMap<String, Value>,
}

impl PerformanceMonitor {
    pub fn new(operation: &str) -> Self {
        Self {
            start_time: SystemTime::now(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn elapsed_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn into_context(self, duration: u64) -> LogContext {
        let mut context = LogContext::new("performance", &self.operation).with_duration_ms(duration);
        for (key, value) in self.metadata {
            context = context.with_metadata(&key, value);
        }
        context
    }

    pub fn finish(self) -> u64 {
        let duration = self.elapsed_ms();
        self.into_context(duration)
            .trace(&format!("Operation completed in {}ms", duration));
        duration
    }

    pub fn finish_with_result<T, E>(self, result: &Result<T, E>) -> u64
    where
        E: std::fmt::Display,
    {
        let duration = self.elapsed_ms();
        let context = self.into_context(duration);

        match result {
            Ok(_) => {
                context.trace(&format!("Operation completed successfully in {}ms", duration));
            }
            Err(e) => {
                context
                    .with_metadata("error", json!(e.to_string()))
                    .debug(&format!("Operation failed after {}ms: {}", duration, e));
            }
        }

        duration
    }
}

/// Error logging utilities
pub struct ErrorLogger;

impl ErrorLogger {
    pub fn log_error(error: &WatcherError, context: Option<LogContext>) {
        let severity = error.severity();

        let log_context = context
            .unwrap_or_else(|| LogContext::new("error", "unknown"))
            .with_error_code(error.code())
            .with_metadata("severity", json!(format!("{:?}", severity)))
            .with_metadata("recoverable", json!(error.is_recoverable()));

        let message = format!("Error occurred: {}", error);

        match severity {
            ErrorSeverity::Critical | ErrorSeverity::High => log_context.error(&message),
            ErrorSeverity::Medium => log_context.warn(&message),
            ErrorSeverity::Low => log_context.info(&message),
        }
    }

    pub fn log_retry_attempt(operation: &str, error: &WatcherError, attempt: u32, max_attempts: u32) {
        let context = LogContext::new("retry", operation)
            .with_retry_count(attempt)
            .with_metadata("max_attempts", json!(max_attempts))
            .with_error_code(error.code());

        if attempt >= max_attempts {
            context.error(&format!("Final attempt failed: {}", error));
        } else {
            context.warn(&format!("Attempt {} of {} failed: {}", attempt, max_attempts, error));
        }
    }

    pub fn log_recovery_success(operation: &str, attempts: u32, total_duration_ms: u64) {
        LogContext::new("retry", "recovered")
            .with_metadata("operation", json!(operation))
            .with_retry_count(attempts)
            .with_duration_ms(total_duration_ms)
            .info(&format!("Operation recovered after {} attempts in {}ms", attempts, total_duration_ms));
    }
}

/// Operational metrics written to the log
pub struct MetricsLogger;

impl MetricsLogger {
    pub fn log_height_scanned(height: u64, log_count: usize, notified: u32) {
        let context = LogContext::new("metrics", "height_scanned")
            .with_block_height(height)
            .with_metadata("log_count", json!(log_count))
            .with_metadata("notified", json!(notified));

        if notified > 0 {
            context.info(&format!("Height {} scanned, {} transfers notified", height, notified));
        } else {
            context.debug(&format!("Height {} scanned, {} logs", height, log_count));
        }
    }

    pub fn log_rpc_call(method: &str, duration_ms: u64, success: bool) {
        let context = LogContext::new("metrics", "rpc_call")
            .with_metadata("method", json!(method))
            .with_duration_ms(duration_ms)
            .with_metadata("success", json!(success));

        if success {
            context.trace(&format!("RPC call {} completed in {}ms", method, duration_ms));
        } else {
            context.debug(&format!("RPC call {} failed after {}ms", method, duration_ms));
        }
    }

    pub fn log_price_sample(rate: &str, stale: bool) {
        let context = LogContext::new("metrics", "price_sample")
            .with_metadata("rate", json!(rate))
            .with_metadata("stale", json!(stale));

        if stale {
            context.warn(&format!("Using last known rate {}", rate));
        } else {
            context.debug(&format!("Fetched rate {}", rate));
        }
    }

    pub fn log_notification(tx_hash: &str, amount: &str, delivered: bool) {
        let context = LogContext::new("metrics", "notification")
            .with_transaction_hash(tx_hash)
            .with_amount(amount)
            .with_metadata("delivered", json!(delivered));

        if delivered {
            context.info(&format!("Notification delivered for {}", tx_hash));
        } else {
            context.error(&format!("Notification lost for {}", tx_hash));
        }
    }

    pub fn log_tick(latest_height: u64, heights_scanned: u64, notified: u32, duration_ms: u64) {
        LogContext::new("metrics", "tick")
            .with_metadata("latest_height", json!(latest_height))
            .with_metadata("heights_scanned", json!(heights_scanned))
            .with_metadata("notified", json!(notified))
            .with_duration_ms(duration_ms)
            .info(&format!(
                "Tick finished at height {}: {} heights, {} notifications",
                latest_height, heights_scanned, notified
            ));
    }
}

/// Initialize structured logging for the application
pub fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            if let Ok(json_value) = serde_json::from_str::<Value>(record.args().to_string().as_str()) {
                writeln!(buf, "{}", serde_json::to_string_pretty(&json_value)?)
            } else {
                writeln!(
                    buf,
                    "{} [{}] {}: {}",
                    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            }
        })
        .try_init()?;

    info!("Structured logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, RpcError};

    #[test]
    fn test_log_context_creation() {
        let context = LogContext::new("scanner", "tick");
        assert_eq!(context.component, "scanner");
        assert_eq!(context.operation, "tick");
        assert!(context.metadata.is_empty());
    }

    #[test]
    fn test_log_context_with_metadata() {
        let context = LogContext::new("test", "test")
            .with_block_height(12345)
            .with_transaction_hash("0xabc123")
            .with_amount("0.25");

        assert_eq!(context.metadata.get("block_height"), Some(&json!(12345)));
        assert_eq!(context.metadata.get("transaction_hash"), Some(&json!("0xabc123")));
        assert_eq!(context.metadata.get("amount"), Some(&json!("0.25")));
    }

    #[test]
    fn test_log_context_format_message() {
        let context = LogContext::new("test", "test").with_metadata("key", json!("value"));

        let message = context.format_message("INFO", "test message");

        let parsed: Value = serde_json::from_str(&message).expect("Should be valid JSON");
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["component"], "test");
        assert_eq!(parsed["message"], "test message");
        assert_eq!(parsed["key"], "value");
    }

    #[test]
    fn test_performance_monitor() {
        let monitor = PerformanceMonitor::new("rpc_eth_blockNumber").with_metadata("attempt", json!(1));
        assert_eq!(monitor.operation, "rpc_eth_blockNumber");
        assert_eq!(monitor.metadata.get("attempt"), Some(&json!(1)));

        let result: Result<(), String> = Err("boom".to_string());
        let duration = monitor.finish_with_result(&result);
        assert!(duration < 1_000);
    }

    #[test]
    fn test_error_and_metrics_logging() {
        // These should not panic
        let error = WatcherError::Config(ConfigError::MissingEnvVar("WATCH_ADDRESS".to_string()));
        ErrorLogger::log_error(&error, Some(LogContext::new("test", "error_test")));
        ErrorLogger::log_retry_attempt(
            "eth_getLogs",
            &WatcherError::Rpc(RpcError::Timeout { seconds: 30 }),
            3,
            3,
        );
        MetricsLogger::log_height_scanned(100, 2, 1);
        MetricsLogger::log_price_sample("1800", true);
        MetricsLogger::log_notification("0xabc", "0.25", false);
        MetricsLogger::log_tick(100, 3, 1, 42);
    }
}
