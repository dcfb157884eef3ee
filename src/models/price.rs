use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Last successfully fetched conversion rate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSample {
    pub rate: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl PriceSample {
    pub fn new(rate: Decimal) -> Self {
        Self {
            rate,
            fetched_at: Utc::now(),
        }
    }

    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.fetched_at).num_seconds()
    }
}
