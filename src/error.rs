use thiserror::Error;

/// Main error type for the transfer watcher
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Price error: {0}")]
    Price(#[from] PriceError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Node unavailable after {attempts} attempts: {source}")]
    NodeUnavailable {
        attempts: u32,
        #[source]
        source: Box<WatcherError>,
    },
}

/// JSON-RPC transport errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i32, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Rate limit exceeded, retry after {seconds} seconds")]
    RateLimit { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Price feed errors
#[derive(Error, Debug)]
pub enum PriceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Price endpoint returned status {0}")]
    Status(u16),

    #[error("Rate missing at {pointer}")]
    MissingRate { pointer: String },

    #[error("Rate is not a valid decimal: {0}")]
    InvalidRate(String),
}

/// Notification channel errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Channel rejected message: status={status}, description={description}")]
    Rejected { status: u16, description: String },
}

/// Errors while turning node data into transfer alerts
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Hex parsing failed: {0}")]
    HexParsing(String),

    #[error("Amount parsing failed: {0}")]
    AmountParsing(String),

    #[error("Calculation overflow: {0}")]
    Overflow(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid Ethereum address: {0}")]
    InvalidAddress(String),

    #[error("Invalid block height: {0}")]
    InvalidBlockHeight(String),

    #[error("Invalid transaction hash: {0}")]
    InvalidTransactionHash(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical errors that stop the process
    Critical,
    /// High priority errors that affect functionality
    High,
    /// Medium priority errors, usually transient
    Medium,
    /// Low priority errors that are mostly informational
    Low,
}

impl WatcherError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            WatcherError::Config(_) => ErrorSeverity::Critical,

            WatcherError::NodeUnavailable { .. } => ErrorSeverity::High,
            WatcherError::Rpc(RpcError::Connection(_)) => ErrorSeverity::High,
            WatcherError::Notify(NotifyError::Rejected { .. }) => ErrorSeverity::High,

            WatcherError::Rpc(RpcError::Timeout { .. }) => ErrorSeverity::Medium,
            WatcherError::Rpc(RpcError::RateLimit { .. }) => ErrorSeverity::Medium,
            WatcherError::Price(_) => ErrorSeverity::Medium,
            WatcherError::Processing(_) => ErrorSeverity::Medium,

            WatcherError::Validation(_) => ErrorSeverity::Low,
            _ => ErrorSeverity::Medium,
        }
    }

    /// Check if the error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            WatcherError::Rpc(_) => true,
            WatcherError::Price(_) => true,
            WatcherError::Notify(NotifyError::Http(_)) => true,
            WatcherError::NodeUnavailable { .. } => true,

            WatcherError::Config(_) => false,
            WatcherError::Validation(_) => false,
            WatcherError::Processing(_) => false,
            WatcherError::Notify(NotifyError::Rejected { .. }) => false,
        }
    }

    /// Short machine-friendly label used in structured log lines
    pub fn code(&self) -> &'static str {
        match self {
            WatcherError::Rpc(_) => "rpc",
            WatcherError::Price(_) => "price",
            WatcherError::Notify(_) => "notify",
            WatcherError::Processing(_) => "processing",
            WatcherError::Config(_) => "config",
            WatcherError::Validation(_) => "validation",
            WatcherError::NodeUnavailable { .. } => "node_unavailable",
        }
    }
}
