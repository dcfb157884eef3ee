use std::sync::Arc;

use crate::blockchain::rpc_client::{LogFilter, NodeRpc};
use crate::error::WatcherError;
use crate::logging::LogContext;
use crate::models::{LogEntry, Transaction};
use crate::retry::{RetryConfig, RetryManager, RetryOutcome};

/// Node access with the retry policy of each query applied.
///
/// `latest_height` turns exhausted retries into `NodeUnavailable`;
/// `logs_in_range` degrades to an empty result instead.
/// Transaction and balance lookups are single attempts.
pub struct NodeClient {
    rpc: Arc<dyn NodeRpc>,
    height_retry: RetryManager,
    logs_retry: RetryManager,
}

impl NodeClient {
    pub fn new(rpc: Arc<dyn NodeRpc>, retry: RetryConfig) -> Self {
        Self {
            rpc,
            height_retry: RetryManager::new("eth_blockNumber", retry.clone()),
            logs_retry: RetryManager::new("eth_getLogs", retry),
        }
    }

    pub async fn latest_height(&self) -> Result<u64, WatcherError> {
        match self.height_retry.execute(|| self.rpc.block_number()).await {
            RetryOutcome::Success { value, .. } => Ok(value),
            RetryOutcome::Exhausted { last_error, attempts } => Err(WatcherError::NodeUnavailable {
                attempts,
                source: Box::new(last_error),
            }),
            RetryOutcome::Aborted { error, .. } => Err(error),
        }
    }

    /// Logs emitted at `address` in the inclusive range; empty after
    /// retries are exhausted.
    pub async fn logs_in_range(&self, from_height: u64, to_height: u64, address: &str) -> Vec<LogEntry> {
        let filter = LogFilter::for_range(from_height, to_height, address);

        match self.logs_retry.execute(|| self.rpc.get_logs(&filter)).await {
            RetryOutcome::Success { value, .. } => value,
            RetryOutcome::Exhausted { last_error: error, attempts }
            | RetryOutcome::Aborted { error, attempts } => {
                LogContext::new("node_client", "logs_in_range")
                    .with_metadata("from_height", serde_json::json!(from_height))
                    .with_metadata("to_height", serde_json::json!(to_height))
                    .with_retry_count(attempts)
                    .with_error_code(error.code())
                    .error(&format!(
                        "Log query failed after {} attempts, treating range as empty: {}",
                        attempts, error
                    ));
                Vec::new()
            }
        }
    }

    pub async fn transaction_by_hash(&self, hash: &str) -> Result<Option<Transaction>, WatcherError> {
        self.rpc.get_transaction(hash).await
    }

    pub async fn balance_of(&self, address: &str) -> Result<u128, WatcherError> {
        self.rpc.get_balance(address).await
    }
}
