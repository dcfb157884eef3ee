use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use crate::blockchain::node_client::NodeClient;
use crate::blockchain::transfer_filter::WatchedAddress;
use crate::cache::DedupCache;
use crate::error::WatcherError;
use crate::logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{
    base_units_to_native, fiat_value, format_native, intensity_units, LogEntry, Transaction, TransferAlert,
    TransferEvent,
};
use crate::notify::Notifier;
use crate::price::PriceOracle;

/// Summary of a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub latest_height: u64,
    /// First height scanned; `from_height > to_height` when nothing was new
    pub from_height: u64,
    pub to_height: u64,
    pub heights_scanned: u64,
    pub logs_seen: usize,
    pub transfers_notified: u32,
    pub transaction_errors: u32,
}

/// What happened to one log entry's transaction
enum Resolution {
    Notified,
    Skipped,
}

/// Finds new transfers into the watched address, one tick at a time.
///
/// Owns the scan cursor, the dedup cache and the price oracle. Every height
/// above the cursor is queried exactly once; the cursor only moves forward,
/// even when a height's log query came back empty after retries.
pub struct TransferScanner {
    node: NodeClient,
    oracle: PriceOracle,
    notifier: Arc<dyn Notifier>,
    watched: WatchedAddress,
    cursor: Option<u64>,
    dedup: DedupCache,
}

impl TransferScanner {
    pub fn new(
        node: NodeClient,
        oracle: PriceOracle,
        notifier: Arc<dyn Notifier>,
        watched: WatchedAddress,
        dedup: DedupCache,
    ) -> Self {
        Self {
            node,
            oracle,
            notifier,
            watched,
            cursor: None,
            dedup,
        }
    }

    /// Last fully processed height, `None` before the first tick
    pub fn cursor(&self) -> Option<u64> {
        self.cursor
    }

    pub fn dedup(&self) -> &DedupCache {
        &self.dedup
    }

    pub fn watched(&self) -> &WatchedAddress {
        &self.watched
    }

    /// Scan every height above the cursor up to the chain head.
    ///
    /// Fails only when the head height cannot be read; the cursor is left
    /// untouched in that case.
    pub async fn tick(&mut self) -> Result<TickReport, WatcherError> {
        let monitor = PerformanceMonitor::new("scanner_tick");

        let latest = self.node.latest_height().await?;
        let cursor = *self.cursor.get_or_insert_with(|| latest.saturating_sub(1));

        let mut report = TickReport {
            latest_height: latest,
            from_height: cursor.saturating_add(1),
            to_height: latest,
            ..TickReport::default()
        };

        if latest < cursor {
            LogContext::new("transfer_scanner", "tick")
                .with_block_height(latest)
                .with_metadata("cursor", json!(cursor))
                .warn("Chain head is behind the cursor, waiting for it to catch up");
        }

        // a cursor at u64::MAX has nothing left to scan
        if let Some(start) = cursor.checked_add(1) {
            for height in start..=latest {
                self.scan_height(height, &mut report).await;
                report.heights_scanned += 1;
            }
        }

        self.cursor = Some(cursor.max(latest));

        MetricsLogger::log_tick(
            latest,
            report.heights_scanned,
            report.transfers_notified,
            monitor.finish(),
        );
        Ok(report)
    }

    async fn scan_height(&mut self, height: u64, report: &mut TickReport) {
        let logs = self.node.logs_in_range(height, height, self.watched.as_str()).await;
        report.logs_seen += logs.len();

        // one sample per height, shared by all of its transfers
        let rate = self.oracle.current_rate().await;

        let mut notified = 0;
        let mut seen = HashSet::new();
        for log in &logs {
            if !seen.insert(log.transaction_hash.to_lowercase()) {
                continue;
            }

            match self.process_log(log, rate).await {
                Ok(Resolution::Notified) => notified += 1,
                Ok(Resolution::Skipped) => {}
                Err(error) => {
                    report.transaction_errors += 1;
                    ErrorLogger::log_error(
                        &error,
                        Some(
                            LogContext::new("transfer_scanner", "process_log")
                                .with_block_height(height)
                                .with_transaction_hash(&log.transaction_hash),
                        ),
                    );
                }
            }
        }

        report.transfers_notified += notified;
        MetricsLogger::log_height_scanned(height, logs.len(), notified);
    }

    async fn process_log(&mut self, log: &LogEntry, rate: Option<Decimal>) -> Result<Resolution, WatcherError> {
        let Some(tx) = self.node.transaction_by_hash(&log.transaction_hash).await? else {
            LogContext::new("transfer_scanner", "process_log")
                .with_transaction_hash(&log.transaction_hash)
                .debug("Transaction not found");
            return Ok(Resolution::Skipped);
        };

        if !self.watched.is_recipient_of(&tx) || self.dedup.contains(&tx.hash) {
            return Ok(Resolution::Skipped);
        }

        let alert = self.build_alert(&tx, log.block_height, rate).await?;

        let delivered = match self.notifier.notify(&alert).await {
            Ok(()) => true,
            Err(error) => {
                ErrorLogger::log_error(
                    &error,
                    Some(LogContext::new("transfer_scanner", "notify").with_transaction_hash(&tx.hash)),
                );
                false
            }
        };
        MetricsLogger::log_notification(&tx.hash, &format_native(&alert.event.value_native), delivered);

        // recorded even when delivery failed
        self.dedup.record(&tx.hash);

        Ok(if delivered { Resolution::Notified } else { Resolution::Skipped })
    }

    async fn build_alert(
        &self,
        tx: &Transaction,
        log_height: u64,
        rate: Option<Decimal>,
    ) -> Result<TransferAlert, WatcherError> {
        let value_native = base_units_to_native(tx.value)?;
        let balance_native = base_units_to_native(self.node.balance_of(self.watched.as_str()).await?)?;
        let value_fiat = fiat_value(value_native, rate);

        Ok(TransferAlert {
            event: TransferEvent {
                transaction_hash: tx.hash.clone(),
                from_address: tx.from.clone(),
                to_address: self.watched.as_str().to_string(),
                value_native,
                block_height: tx.block_height.unwrap_or(log_height),
            },
            rate,
            value_fiat,
            balance_native,
            balance_fiat: fiat_value(balance_native, rate),
            intensity: intensity_units(value_native, rate),
        })
    }
}
