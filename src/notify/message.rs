//! Markdown captions for transfer alerts.

use rust_decimal::Decimal;

use crate::config::NotifierConfig;
use crate::models::{format_fiat, format_native, intensity_bar, TransferAlert};

/// Presentation settings for rendered alerts
#[derive(Debug, Clone, PartialEq)]
pub struct MessageStyle {
    pub explorer_url: String,
    pub native_symbol: String,
    pub fiat_symbol: String,
    pub glyph: String,
}

impl Default for MessageStyle {
    fn default() -> Self {
        Self::from(&NotifierConfig::default())
    }
}

impl From<&NotifierConfig> for MessageStyle {
    fn from(config: &NotifierConfig) -> Self {
        Self {
            explorer_url: config.explorer_url.clone(),
            native_symbol: config.native_symbol.clone(),
            fiat_symbol: config.fiat_symbol.clone(),
            glyph: config.glyph.clone(),
        }
    }
}

/// Render the caption sent for `alert`.
///
/// Fiat amounts are only shown when a rate was available.
pub fn render(alert: &TransferAlert, style: &MessageStyle) -> String {
    let event = &alert.event;
    let mut lines = Vec::with_capacity(8);

    lines.push("🚀 *New Buy!* 🚀".to_string());
    lines.push(intensity_bar(alert.intensity, &style.glyph));
    lines.push(String::new());
    lines.push(format!(
        "📥 *Amount:* {} {}{}",
        format_native(&event.value_native),
        style.native_symbol,
        fiat_suffix(alert.value_fiat, style)
    ));
    lines.push(format!(
        "👤 *Sender:* [{}]({}{})",
        event.from_address, style.explorer_url, event.from_address
    ));
    lines.push(format!(
        "💰 *Total Balance:* {} {}{}",
        format_native(&alert.balance_native),
        style.native_symbol,
        fiat_suffix(alert.balance_fiat, style)
    ));
    lines.push(format!(
        "🔗 [Transaction]({}{})",
        transaction_url(&style.explorer_url),
        event.transaction_hash
    ));

    lines.join("\n")
}

fn fiat_suffix(value: Option<Decimal>, style: &MessageStyle) -> String {
    match value {
        Some(_) => format!(" ({}{})", style.fiat_symbol, format_fiat(value)),
        None => String::new(),
    }
}

// ".../address/" -> ".../tx/"
fn transaction_url(explorer_url: &str) -> String {
    match explorer_url.strip_suffix("address/") {
        Some(base) => format!("{}tx/", base),
        None => explorer_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransferEvent;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn alert(rate: Option<&str>) -> TransferAlert {
        let rate = rate.map(dec);
        let value = dec("0.25");
        let balance = dec("12.5");
        let value_fiat = crate::models::fiat_value(value, rate);
        TransferAlert {
            event: TransferEvent {
                transaction_hash: "0xfeed".to_string(),
                from_address: "0x1234567890123456789012345678901234567890".to_string(),
                to_address: "0xf977814e90da44bfa03b6295a0616a897441acec".to_string(),
                value_native: value,
                block_height: 100,
            },
            rate,
            value_fiat,
            balance_native: balance,
            balance_fiat: crate::models::fiat_value(balance, rate),
            intensity: crate::models::intensity_units(value, rate),
        }
    }

    #[test]
    fn test_render_with_rate() {
        let style = MessageStyle { glyph: "*".to_string(), ..MessageStyle::default() };
        let text = render(&alert(Some("2000")), &style);

        assert!(text.contains("📥 *Amount:* 0.25 ETH ($500.00)"));
        assert!(text.contains(
            "[0x1234567890123456789012345678901234567890](https://etherscan.io/address/0x1234567890123456789012345678901234567890)"
        ));
        assert!(text.contains("💰 *Total Balance:* 12.5 ETH ($25000.00)"));
        assert!(text.contains("(https://etherscan.io/tx/0xfeed)"));
        assert!(text.lines().any(|line| line == "*".repeat(60)));
    }

    #[test]
    fn test_render_without_rate() {
        let style = MessageStyle { glyph: "#".to_string(), ..MessageStyle::default() };
        let text = render(&alert(None), &style);

        assert!(text.contains("📥 *Amount:* 0.25 ETH\n"));
        assert!(!text.contains('$'));
        assert!(text.lines().any(|line| line == "#".repeat(16)));
    }

    #[test]
    fn test_transaction_url() {
        assert_eq!(transaction_url("https://etherscan.io/address/"), "https://etherscan.io/tx/");
        assert_eq!(transaction_url("https://explorer.example/"), "https://explorer.example/");
    }
}
