use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Log entry emitted at the watched address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_height: u64,
    pub transaction_hash: String,
    pub log_index: u32,
}

/// Transaction as resolved from the node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    /// `None` for contract creations
    pub to: Option<String>,
    /// Transferred value in base units
    pub value: u128,
    /// `None` while still pending
    pub block_height: Option<u64>,
}

/// A value transfer into the watched account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferEvent {
    pub transaction_hash: String,
    pub from_address: String,
    pub to_address: String,
    /// Amount in native units (base units scaled by 10^18)
    pub value_native: Decimal,
    pub block_height: u64,
}

/// A transfer together with everything the notification shows about it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferAlert {
    pub event: TransferEvent,
    /// Rate used for every fiat field, shared by all transfers of a height
    pub rate: Option<Decimal>,
    pub value_fiat: Option<Decimal>,
    pub balance_native: Decimal,
    pub balance_fiat: Option<Decimal>,
    /// Number of glyphs in the intensity bar
    pub intensity: usize,
}
