use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{ProcessingError, RpcError, WatcherError};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{LogEntry, Transaction};

/// Raw node queries, one network round-trip each and no retries.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Current chain height
    async fn block_number(&self) -> Result<u64, WatcherError>;

    /// Logs matching the filter
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, WatcherError>;

    /// Transaction by hash, `None` when the node does not know it
    async fn get_transaction(&self, hash: &str) -> Result<Option<Transaction>, WatcherError>;

    /// Balance of `address` at the latest block, in base units
    async fn get_balance(&self, address: &str) -> Result<u128, WatcherError>;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogFilter {
    #[serde(rename = "fromBlock")]
    pub from_block: String,
    #[serde(rename = "toBlock")]
    pub to_block: String,
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<Option<String>>>,
}

impl LogFilter {
    /// Logs emitted at `address` within the inclusive height range
    pub fn for_range(from_height: u64, to_height: u64, address: &str) -> Self {
        Self {
            from_block: format!("0x{:x}", from_height),
            to_block: format!("0x{:x}", to_height),
            address: Some(address.to_string()),
            topics: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EthLog {
    address: String,
    topics: Vec<String>,
    data: String,
    #[serde(rename = "blockNumber")]
    block_number: String,
    #[serde(rename = "transactionHash")]
    transaction_hash: String,
    #[serde(rename = "logIndex")]
    log_index: String,
}

#[derive(Debug, Deserialize)]
struct EthTransaction {
    hash: String,
    from: String,
    to: Option<String>,
    value: String,
    #[serde(rename = "blockNumber")]
    block_number: Option<String>,
}

/// Ethereum JSON-RPC client over HTTP
#[derive(Debug)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(endpoint: &str, timeout_seconds: u64) -> Result<Self, RpcError> {
        LogContext::new("rpc_client", "initialization")
            .with_metadata("endpoint", serde_json::json!(endpoint))
            .with_metadata("timeout_seconds", serde_json::json!(timeout_seconds))
            .info("Initializing RPC client");

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            timeout_seconds,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn make_request(&self, method: &str, params: Vec<Value>) -> Result<Value, WatcherError> {
        let monitor = PerformanceMonitor::new(&format!("rpc_{}", method));
        let result = self.send_request(method, params).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call(method, duration, result.is_ok());
        result
    }

    async fn send_request(&self, method: &str, params: Vec<Value>) -> Result<Value, WatcherError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        LogContext::new("rpc_client", "make_request")
            .with_metadata("method", serde_json::json!(method))
            .trace(&format!("Sending RPC request: {}", method));

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_http_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RpcError::RateLimit { seconds: 60 }.into());
        }
        if !status.is_success() {
            let error_msg = format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );
            return Err(RpcError::Connection(error_msg).into());
        }

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(format!("Malformed JSON-RPC body: {}", e)))?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Method {
                code: error.code,
                message: error.message,
            }
            .into());
        }

        // A JSON null result is meaningful (e.g. unknown transaction)
        Ok(rpc_response.result.unwrap_or(Value::Null))
    }

    fn classify_http_error(&self, e: reqwest::Error) -> WatcherError {
        let error = if e.is_timeout() {
            RpcError::Timeout { seconds: self.timeout_seconds }
        } else if e.is_connect() {
            RpcError::Connection(e.to_string())
        } else {
            RpcError::Http(e)
        };
        error.into()
    }
}

#[async_trait]
impl NodeRpc for RpcClient {
    async fn block_number(&self) -> Result<u64, WatcherError> {
        let value = self.make_request("eth_blockNumber", vec![]).await?;
        let hex_string = value
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("Block number is not a string".to_string()))?;
        let height = parse_hex_to_u64(hex_string)?;

        LogContext::new("rpc_client", "block_number")
            .with_block_height(height)
            .debug(&format!("Retrieved latest block number: {}", height));

        Ok(height)
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, WatcherError> {
        let params = vec![serde_json::to_value(filter).map_err(RpcError::Json)?];
        let value = self.make_request("eth_getLogs", params).await?;

        let eth_logs: Vec<EthLog> = serde_json::from_value(value)
            .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse logs: {}", e)))?;

        let mut logs = Vec::with_capacity(eth_logs.len());
        for eth_log in eth_logs {
            logs.push(LogEntry {
                block_height: parse_hex_to_u64(&eth_log.block_number)?,
                log_index: parse_hex_to_u32(&eth_log.log_index)?,
                address: eth_log.address,
                topics: eth_log.topics,
                data: eth_log.data,
                transaction_hash: eth_log.transaction_hash,
            });
        }

        LogContext::new("rpc_client", "get_logs")
            .with_metadata("log_count", serde_json::json!(logs.len()))
            .with_metadata("from_block", serde_json::json!(filter.from_block))
            .with_metadata("to_block", serde_json::json!(filter.to_block))
            .debug(&format!("Retrieved {} logs", logs.len()));

        Ok(logs)
    }

    async fn get_transaction(&self, hash: &str) -> Result<Option<Transaction>, WatcherError> {
        let value = self
            .make_request("eth_getTransactionByHash", vec![Value::String(hash.to_string())])
            .await?;

        if value.is_null() {
            return Ok(None);
        }

        let eth_tx: EthTransaction = serde_json::from_value(value)
            .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse transaction {}: {}", hash, e)))?;

        let block_height = match eth_tx.block_number.as_deref() {
            Some(hex) => Some(parse_hex_to_u64(hex)?),
            None => None,
        };

        Ok(Some(Transaction {
            value: parse_hex_to_u128(&eth_tx.value)?,
            hash: eth_tx.hash,
            from: eth_tx.from,
            to: eth_tx.to,
            block_height,
        }))
    }

    async fn get_balance(&self, address: &str) -> Result<u128, WatcherError> {
        let params = vec![Value::String(address.to_string()), Value::String("latest".to_string())];
        let value = self.make_request("eth_getBalance", params).await?;
        let hex_string = value
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("Balance is not a string".to_string()))?;

        Ok(parse_hex_to_u128(hex_string)?)
    }
}

fn strip_hex_prefix(hex_str: &str) -> &str {
    hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str)
}

pub(crate) fn parse_hex_to_u64(hex_str: &str) -> Result<u64, ProcessingError> {
    u64::from_str_radix(strip_hex_prefix(hex_str), 16)
        .map_err(|e| ProcessingError::HexParsing(format!("'{}' to u64: {}", hex_str, e)))
}

pub(crate) fn parse_hex_to_u32(hex_str: &str) -> Result<u32, ProcessingError> {
    u32::from_str_radix(strip_hex_prefix(hex_str), 16)
        .map_err(|e| ProcessingError::HexParsing(format!("'{}' to u32: {}", hex_str, e)))
}

pub(crate) fn parse_hex_to_u128(hex_str: &str) -> Result<u128, ProcessingError> {
    let digits = strip_hex_prefix(hex_str);
    // Quantities may be zero-padded past 32 hex digits
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return if digits.is_empty() {
            Err(ProcessingError::HexParsing(format!("'{}' is empty", hex_str)))
        } else {
            Ok(0)
        };
    }
    u128::from_str_radix(trimmed, 16)
        .map_err(|e| ProcessingError::HexParsing(format!("'{}' to u128: {}", hex_str, e)))
}
