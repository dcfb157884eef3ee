use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tokio::time::{interval, MissedTickBehavior};
use log::{debug, error, info};

use crate::blockchain::transfer_scanner::{TickReport, TransferScanner};
use crate::error::WatcherError;
use crate::logging::{ErrorLogger, LogContext};

/// Handle that stops a running [`Scheduler`] from another task
#[derive(Clone)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl ShutdownHandle {
    fn new() -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn shutdown(&self) {
        info!("Requesting graceful shutdown");
        self.requested.store(true, Ordering::Relaxed);
        self.wake.notify_one();
    }

    pub fn is_shutdown(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }
}

/// Drives the scanner on a fixed interval.
///
/// Ticks never overlap: the next interval is only awaited after the current
/// tick returned, and intervals missed while a tick ran are delayed rather
/// than fired in a burst.
pub struct Scheduler {
    scanner: TransferScanner,
    poll_interval: Duration,
    shutdown: ShutdownHandle,
}

impl Scheduler {
    pub fn new(scanner: TransferScanner, poll_interval: Duration) -> Self {
        Self {
            scanner,
            poll_interval,
            shutdown: ShutdownHandle::new(),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Request graceful shutdown
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    pub fn scanner(&self) -> &TransferScanner {
        &self.scanner
    }

    /// Run a single tick, logging its outcome
    pub async fn run_once(&mut self) -> Result<TickReport, WatcherError> {
        let result = self.scanner.tick().await;

        match &result {
            Ok(report) if report.heights_scanned > 0 => {
                LogContext::new("scheduler", "tick")
                    .with_block_height(report.latest_height)
                    .with_metadata("heights_scanned", serde_json::json!(report.heights_scanned))
                    .with_metadata("transfers_notified", serde_json::json!(report.transfers_notified))
                    .debug("Tick complete");
            }
            Ok(_) => {}
            Err(e) => {
                ErrorLogger::log_error(e, Some(LogContext::new("scheduler", "tick")));
            }
        }

        result
    }

    /// Tick until Ctrl-C or [`Scheduler::shutdown`]. Tick failures are
    /// logged and the next tick resumes from the cursor.
    pub async fn run(&mut self) {
        info!(
            "Watching {} every {} seconds",
            self.scanner.watched(),
            self.poll_interval.as_secs()
        );

        let handle = self.shutdown.clone();
        let ctrl_c = tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received shutdown signal");
                    handle.shutdown();
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.shutdown.is_shutdown() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.shutdown.wake.notified() => {}
            }

            if self.shutdown.is_shutdown() {
                break;
            }

            if let Err(e) = self.run_once().await {
                debug!("Tick failed ({}), resuming from cursor {:?}", e.code(), self.scanner.cursor());
            }
        }

        ctrl_c.abort();
        info!("Scheduler stopped at height {:?}", self.scanner.cursor());
    }
}
