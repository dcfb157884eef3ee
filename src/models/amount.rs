//! Fixed-point conversions between base units, native units and fiat.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::ProcessingError;

/// Decimals of the chain's native asset (wei per ether)
pub const NATIVE_DECIMALS: u32 = 18;

/// Glyph count used when no tier threshold is reached or no rate is known
pub const MIN_INTENSITY: usize = 16;

/// (fiat threshold, glyph count), highest first
const INTENSITY_TIERS: [(i64, usize); 6] = [
    (500, 60),
    (400, 52),
    (300, 44),
    (200, 36),
    (150, 28),
    (100, 20),
];

/// Convert base units into native units without losing precision
pub fn base_units_to_native(value: u128) -> Result<Decimal, ProcessingError> {
    let signed = i128::try_from(value)
        .map_err(|_| ProcessingError::Overflow(format!("{} base units", value)))?;
    Decimal::try_from_i128_with_scale(signed, NATIVE_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|e| ProcessingError::AmountParsing(format!("{} base units: {}", value, e)))
}

/// Fiat equivalent of `amount`, rounded half away from zero to cents.
/// `None` without a rate.
pub fn fiat_value(amount: Decimal, rate: Option<Decimal>) -> Option<Decimal> {
    amount
        .checked_mul(rate?)
        .map(|v| v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

pub fn format_native(amount: &Decimal) -> String {
    amount.normalize().to_string()
}

/// Two-decimal fiat text, or an empty string when no value is available
pub fn format_fiat(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => String::new(),
    }
}

/// Glyph count for a single transfer of `amount` at `rate`.
///
/// Monotonic step function with no lower cutoff. The tier is picked from the
/// exact product, before any rounding to cents, so 499.995 stays below 500.
/// A missing rate maps to the smallest tier.
pub fn intensity_units(amount: Decimal, rate: Option<Decimal>) -> usize {
    match rate.and_then(|rate| amount.checked_mul(rate)) {
        Some(fiat) => tier_for(fiat),
        None => MIN_INTENSITY,
    }
}

fn tier_for(fiat: Decimal) -> usize {
    INTENSITY_TIERS
        .iter()
        .find(|(threshold, _)| fiat >= Decimal::from(*threshold))
        .map(|(_, units)| *units)
        .unwrap_or(MIN_INTENSITY)
}

pub fn intensity_bar(units: usize, glyph: &str) -> String {
    glyph.repeat(units)
}
