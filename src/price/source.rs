use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

use crate::config::PriceConfig;
use crate::error::{PriceError, WatcherError};
use crate::logging::{LogContext, PerformanceMonitor};

/// A single request for the current native/fiat rate
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_rate(&self) -> Result<Decimal, WatcherError>;
}

/// Price endpoint answering a GET with JSON.
///
/// The rate is located with a JSON pointer, e.g. `/ethereum/usd` for
/// CoinGecko's `/simple/price`. Numbers and numeric strings are accepted.
pub struct HttpPriceSource {
    client: Client,
    url: String,
    rate_pointer: String,
}

impl HttpPriceSource {
    pub fn new(config: &PriceConfig) -> Result<Self, PriceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            rate_pointer: config.rate_pointer.clone(),
        })
    }

    async fn request_rate(&self) -> Result<Decimal, PriceError> {
        let response = self
            .client
            .get(&self.url)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        self.extract_rate(&body)
    }

    fn extract_rate(&self, body: &Value) -> Result<Decimal, PriceError> {
        let raw = body.pointer(&self.rate_pointer).ok_or_else(|| PriceError::MissingRate {
            pointer: self.rate_pointer.clone(),
        })?;
        parse_rate(raw)
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch_rate(&self) -> Result<Decimal, WatcherError> {
        let monitor = PerformanceMonitor::new("price_fetch");

        let result = self.request_rate().await;
        monitor.finish_with_result(&result);

        let rate = result?;
        LogContext::new("price_source", "fetch_rate")
            .with_metadata("rate", serde_json::json!(rate.to_string()))
            .trace("Fetched rate");
        Ok(rate)
    }
}

fn parse_rate(raw: &Value) -> Result<Decimal, PriceError> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => return Err(PriceError::InvalidRate(other.to_string())),
    };

    let rate = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| PriceError::InvalidRate(text.clone()))?;

    if rate <= Decimal::ZERO {
        return Err(PriceError::InvalidRate(text));
    }
    Ok(rate)
}
