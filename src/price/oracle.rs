use rust_decimal::Decimal;
use std::sync::Arc;

use crate::logging::{LogContext, MetricsLogger};
use crate::models::PriceSample;
use crate::price::source::PriceSource;
use crate::retry::{RetryConfig, RetryManager, RetryOutcome};

/// Current conversion rate with a stale-value fallback.
///
/// Every successful fetch replaces the cached sample; failed fetches leave
/// it untouched, so once a rate has been seen it is never lost.
pub struct PriceOracle {
    source: Arc<dyn PriceSource>,
    retry: RetryManager,
    last_sample: Option<PriceSample>,
}

impl PriceOracle {
    pub fn new(source: Arc<dyn PriceSource>, retry: RetryConfig) -> Self {
        Self {
            source,
            retry: RetryManager::new("price_fetch", retry),
            last_sample: None,
        }
    }

    /// Fetch the rate, falling back to the last known one. `None` only if
    /// no fetch has ever succeeded.
    pub async fn current_rate(&mut self) -> Option<Decimal> {
        let outcome = self.retry.execute(|| self.source.fetch_rate()).await;

        match outcome {
            RetryOutcome::Success { value, .. } => {
                MetricsLogger::log_price_sample(&value.to_string(), false);
                self.last_sample = Some(PriceSample::new(value));
                Some(value)
            }
            RetryOutcome::Exhausted { last_error: error, attempts }
            | RetryOutcome::Aborted { error, attempts } => match &self.last_sample {
                Some(sample) => {
                    LogContext::new("price_oracle", "current_rate")
                        .with_retry_count(attempts)
                        .with_metadata("age_seconds", serde_json::json!(sample.age_seconds()))
                        .warn(&format!("Price fetch failed, using last known rate: {}", error));
                    MetricsLogger::log_price_sample(&sample.rate.to_string(), true);
                    Some(sample.rate)
                }
                None => {
                    LogContext::new("price_oracle", "current_rate")
                        .with_retry_count(attempts)
                        .error(&format!("Price fetch failed and no rate is cached: {}", error));
                    None
                }
            },
        }
    }

    pub fn last_sample(&self) -> Option<&PriceSample> {
        self.last_sample.as_ref()
    }
}
