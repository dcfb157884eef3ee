pub mod blockchain;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod price;
pub mod retry;

pub use blockchain::{NodeClient, RpcClient, Scheduler, TickReport, TransferScanner, WatchedAddress};
pub use cache::DedupCache;
pub use config::{AppConfig, LoggingConfig, NodeConfig, NotifierConfig, PriceConfig, ScannerConfig};
pub use error::{Result, WatcherError};
pub use logging::{init_logging, ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
pub use notify::{Notifier, TelegramNotifier};
pub use price::{HttpPriceSource, PriceOracle, PriceSource};
pub use retry::{RetryConfig, RetryManager, RetryOutcome};
