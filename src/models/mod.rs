pub mod amount;
pub mod price;
pub mod transaction;

pub use amount::{base_units_to_native, fiat_value, format_fiat, format_native, intensity_bar, intensity_units};
pub use price::PriceSample;
pub use transaction::{LogEntry, Transaction, TransferAlert, TransferEvent};
