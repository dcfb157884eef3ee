use std::fmt;

use crate::error::ValidationError;
use crate::models::Transaction;

/// The single account whose incoming transfers are watched.
///
/// Always stored lowercase with a `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchedAddress(String);

impl WatchedAddress {
    pub fn parse(address: &str) -> Result<Self, ValidationError> {
        validate_address(address)?;
        Ok(Self(format!("0x{}", normalize_address(address))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against any address representation
    pub fn matches(&self, address: &str) -> bool {
        normalize_address(address) == self.0[2..]
    }

    /// True when the transaction is sent to this address
    pub fn is_recipient_of(&self, tx: &Transaction) -> bool {
        tx.to.as_deref().map(|to| self.matches(to)).unwrap_or(false)
    }
}

impl fmt::Display for WatchedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize an Ethereum address to lowercase without 0x prefix
pub fn normalize_address(address: &str) -> String {
    let addr = address.trim();
    if addr.starts_with("0x") || addr.starts_with("0X") {
        addr[2..].to_lowercase()
    } else {
        addr.to_lowercase()
    }
}

/// Validate that an address is a valid Ethereum address format
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    let normalized = normalize_address(address);

    if normalized.len() != 40 {
        return Err(ValidationError::InvalidAddress(format!(
            "Address must be 40 characters long, got {}",
            normalized.len()
        )));
    }

    if !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidAddress(
            "Address contains non-hexadecimal characters".to_string(),
        ));
    }

    Ok(())
}
