pub mod oracle;
pub mod source;

pub use oracle::PriceOracle;
pub use source::{HttpPriceSource, PriceSource};
