use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::blockchain::transfer_filter::validate_address;
use crate::error::ConfigError;
use crate::retry::RetryConfig;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub node: NodeConfig,
    pub scanner: ScannerConfig,
    pub price: PriceConfig,
    pub notifier: NotifierConfig,
    pub logging: LoggingConfig,
}

/// Ethereum node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// JSON-RPC endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Attempts for height and log queries
    pub max_attempts: u32,
    /// Fixed delay between attempts in seconds
    pub retry_delay_seconds: u64,
}

/// Transfer scanning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Account whose incoming transfers are reported
    pub watch_address: String,
    /// Seconds between ticks
    pub poll_interval_seconds: u64,
    /// Number of notified transaction hashes remembered
    pub dedup_capacity: usize,
}

/// Price endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    pub url: String,
    /// JSON pointer to the rate inside the response body
    pub rate_pointer: String,
    pub timeout_seconds: u64,
    pub max_attempts: u32,
    pub retry_delay_seconds: u64,
}

/// Telegram channel configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
    /// Telegram file id of a video attached to every alert
    pub media_file_id: Option<String>,
    pub button_text: String,
    /// No button is attached when empty
    pub button_url: String,
    /// Prefix for sender links, the address is appended
    pub explorer_url: String,
    pub native_symbol: String,
    pub fiat_symbol: String,
    /// Glyph repeated to draw the intensity bar
    pub glyph: String,
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_seconds: 30,
            max_attempts: 3,
            retry_delay_seconds: 2,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            watch_address: String::new(),
            poll_interval_seconds: 15,
            dedup_capacity: crate::cache::DEFAULT_DEDUP_CAPACITY,
        }
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            url: "https://api.coingecko.com/api/v3/simple/price?ids=ethereum&vs_currencies=usd".to_string(),
            rate_pointer: "/ethereum/usd".to_string(),
            timeout_seconds: 10,
            max_attempts: 3,
            retry_delay_seconds: 2,
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
            media_file_id: None,
            button_text: "🚀 Open sale page".to_string(),
            button_url: "https://www.pinksale.finance/".to_string(),
            explorer_url: "https://etherscan.io/address/".to_string(),
            native_symbol: "ETH".to_string(),
            fiat_symbol: "$".to_string(),
            glyph: "🟢".to_string(),
            timeout_seconds: 15,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.bot_token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("NotifierConfig")
            .field("api_base", &self.api_base)
            .field("bot_token", &token)
            .field("chat_id", &self.chat_id)
            .field("media_file_id", &self.media_file_id)
            .field("button_text", &self.button_text)
            .field("button_url", &self.button_url)
            .field("explorer_url", &self.explorer_url)
            .field("native_symbol", &self.native_symbol)
            .field("fiat_symbol", &self.fiat_symbol)
            .field("glyph", &self.glyph)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl NodeConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::fixed(self.max_attempts, Duration::from_secs(self.retry_delay_seconds))
    }
}

impl PriceConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::fixed(self.max_attempts, Duration::from_secs(self.retry_delay_seconds))
    }
}

impl ScannerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

impl AppConfig {
    /// Load `.env`, the TOML file named by `CONFIG_FILE` (optional), then
    /// environment overrides. Environment variables take precedence.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_path(None)
    }

    /// Same as [`AppConfig::load`], but an explicit path must exist
    pub fn load_with_path(path: Option<&str>) -> Result<Self, ConfigError> {
        // a missing .env is normal
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load_from_file()?,
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the TOML file named by `CONFIG_FILE`,
    /// falling back to defaults when it does not exist
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // Node configuration
        if let Ok(endpoint) = env::var("ETHEREUM_RPC") {
            self.node.endpoint = endpoint;
        }
        if let Some(timeout) = parse_env("RPC_TIMEOUT_SECONDS")? {
            self.node.timeout_seconds = timeout;
        }
        if let Some(attempts) = parse_env("RPC_MAX_ATTEMPTS")? {
            self.node.max_attempts = attempts;
        }

        // Scanner configuration
        if let Ok(address) = env::var("WATCH_ADDRESS") {
            self.scanner.watch_address = address;
        }
        if let Some(interval) = parse_env("POLL_INTERVAL_SECONDS")? {
            self.scanner.poll_interval_seconds = interval;
        }
        if let Some(capacity) = parse_env("DEDUP_CAPACITY")? {
            self.scanner.dedup_capacity = capacity;
        }

        // Price configuration
        if let Ok(url) = env::var("PRICE_URL") {
            self.price.url = url;
        }
        if let Ok(pointer) = env::var("PRICE_RATE_POINTER") {
            self.price.rate_pointer = pointer;
        }

        // Notifier configuration
        if let Ok(token) = env::var("TELEGRAM_BOT_TOKEN") {
            self.notifier.bot_token = token;
        }
        if let Ok(chat_id) = env::var("TELEGRAM_CHAT_ID") {
            self.notifier.chat_id = chat_id;
        }
        if let Ok(file_id) = env::var("TELEGRAM_MEDIA_FILE_ID") {
            self.notifier.media_file_id = if file_id.trim().is_empty() { None } else { Some(file_id) };
        }
        if let Ok(url) = env::var("BUTTON_URL") {
            self.notifier.button_url = url;
        }

        // Logging configuration
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Required values
        if self.node.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("ETHEREUM_RPC".to_string()));
        }
        if self.scanner.watch_address.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("WATCH_ADDRESS".to_string()));
        }
        if self.notifier.bot_token.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".to_string()));
        }
        if self.notifier.chat_id.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("TELEGRAM_CHAT_ID".to_string()));
        }

        for url in [&self.node.endpoint, &self.price.url, &self.notifier.api_base] {
            if !is_http_url(url) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if !self.notifier.button_url.is_empty() && !is_http_url(&self.notifier.button_url) {
            return Err(ConfigError::InvalidUrl(self.notifier.button_url.clone()));
        }

        if validate_address(&self.scanner.watch_address).is_err() {
            return Err(invalid("scanner.watch_address", &self.scanner.watch_address));
        }

        if self.node.timeout_seconds == 0 || self.node.timeout_seconds > 300 {
            return Err(invalid("node.timeout_seconds", self.node.timeout_seconds));
        }
        if self.node.max_attempts == 0 || self.node.max_attempts > 20 {
            return Err(invalid("node.max_attempts", self.node.max_attempts));
        }
        if self.price.max_attempts == 0 || self.price.max_attempts > 20 {
            return Err(invalid("price.max_attempts", self.price.max_attempts));
        }
        if self.price.timeout_seconds == 0 || self.price.timeout_seconds > 300 {
            return Err(invalid("price.timeout_seconds", self.price.timeout_seconds));
        }
        if !self.price.rate_pointer.starts_with('/') {
            return Err(invalid("price.rate_pointer", &self.price.rate_pointer));
        }

        if self.scanner.poll_interval_seconds == 0 || self.scanner.poll_interval_seconds > 3600 {
            return Err(invalid("scanner.poll_interval_seconds", self.scanner.poll_interval_seconds));
        }
        if self.scanner.dedup_capacity == 0 {
            return Err(invalid("scanner.dedup_capacity", self.scanner.dedup_capacity));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(invalid("logging.level", &self.logging.level));
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        let mut config = Self::default();
        config.node.endpoint = "https://ethereum-rpc.publicnode.com".to_string();
        config.scanner.watch_address = "0x0000000000000000000000000000000000000000".to_string();
        toml::to_string_pretty(&config).map_err(|e| ConfigError::Parsing(e.to_string()))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key: key.to_string(), value }),
        Err(_) => Ok(None),
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::NamedTempFile;

    const ENV_KEYS: [&str; 15] = [
        "CONFIG_FILE",
        "ETHEREUM_RPC",
        "RPC_TIMEOUT_SECONDS",
        "RPC_MAX_ATTEMPTS",
        "WATCH_ADDRESS",
        "POLL_INTERVAL_SECONDS",
        "DEDUP_CAPACITY",
        "PRICE_URL",
        "PRICE_RATE_POINTER",
        "TELEGRAM_BOT_TOKEN",
        "TELEGRAM_CHAT_ID",
        "TELEGRAM_MEDIA_FILE_ID",
        "BUTTON_URL",
        "LOG_LEVEL",
        "RUST_LOG",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
    }

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.node.endpoint = "https://rpc.example.org".to_string();
        config.scanner.watch_address = "0xF977814e90dA44bFA03b6295A0616a897441aceC".to_string();
        config.notifier.bot_token = "123456:secret".to_string();
        config.notifier.chat_id = "-1001234".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.node.timeout_seconds, 30);
        assert_eq!(config.node.max_attempts, 3);
        assert_eq!(config.node.retry_delay_seconds, 2);
        assert_eq!(config.scanner.poll_interval_seconds, 15);
        assert_eq!(config.scanner.dedup_capacity, 1000);
        assert_eq!(config.price.rate_pointer, "/ethereum/usd");
        assert_eq!(config.notifier.api_base, "https://api.telegram.org");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_required_values_fail_fast() {
        let config = AppConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingEnvVar(key)) if key == "ETHEREUM_RPC"));

        let mut config = valid_config();
        config.notifier.bot_token.clear();
        assert!(matches!(config.validate(), Err(ConfigError::MissingEnvVar(key)) if key == "TELEGRAM_BOT_TOKEN"));

        let mut config = valid_config();
        config.notifier.chat_id = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingEnvVar(key)) if key == "TELEGRAM_CHAT_ID"));
    }

    #[test]
    fn test_config_validation() {
        assert!(valid_config().validate().is_ok());

        let mut config = valid_config();
        config.node.endpoint = "ws://rpc.example.org".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

        let mut config = valid_config();
        config.scanner.watch_address = "0x1234".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut config = valid_config();
        config.scanner.poll_interval_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.scanner.dedup_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.price.rate_pointer = "ethereum.usd".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bot_token_is_redacted() {
        let config = valid_config();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("123456:secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("ETHEREUM_RPC", "https://test-rpc.com/");
        env::set_var("WATCH_ADDRESS", "0xf977814e90da44bfa03b6295a0616a897441acec");
        env::set_var("POLL_INTERVAL_SECONDS", "5");
        env::set_var("TELEGRAM_MEDIA_FILE_ID", "video-id");
        env::set_var("LOG_LEVEL", "debug");

        let mut config = AppConfig::default();
        config.apply_env_overrides().unwrap();

        assert_eq!(config.node.endpoint, "https://test-rpc.com/");
        assert_eq!(config.scanner.watch_address, "0xf977814e90da44bfa03b6295a0616a897441acec");
        assert_eq!(config.scanner.poll_interval_seconds, 5);
        assert_eq!(config.notifier.media_file_id.as_deref(), Some("video-id"));
        assert_eq!(config.logging.level, "debug");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_values() {
        clear_env();
        env::set_var("POLL_INTERVAL_SECONDS", "soon");

        let mut config = AppConfig::default();
        let result = config.apply_env_overrides();

        assert!(matches!(result, Err(ConfigError::InvalidValue { key, .. }) if key == "POLL_INTERVAL_SECONDS"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_file_loading() {
        clear_env();
        let config_content = r#"
[node]
endpoint = "https://custom-rpc.com/"
timeout_seconds = 45

[scanner]
watch_address = "0x1234567890123456789012345678901234567890"
poll_interval_seconds = 30

[notifier]
bot_token = "file-token"
chat_id = "42"
media_file_id = "CgACAgQ"

[logging]
level = "warn"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut temp_file, config_content.as_bytes()).unwrap();
        env::set_var("CONFIG_FILE", temp_file.path().to_str().unwrap());

        let config = AppConfig::load_from_file().unwrap();

        assert_eq!(config.node.endpoint, "https://custom-rpc.com/");
        assert_eq!(config.node.timeout_seconds, 45);
        // unspecified fields keep their defaults
        assert_eq!(config.node.max_attempts, 3);
        assert_eq!(config.scanner.poll_interval_seconds, 30);
        assert_eq!(config.scanner.dedup_capacity, 1000);
        assert_eq!(config.notifier.media_file_id.as_deref(), Some("CgACAgQ"));
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_takes_precedence_over_file() {
        clear_env();
        let mut temp_file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut temp_file,
            b"[node]\nendpoint = \"https://file-rpc.com/\"\n\n[scanner]\nwatch_address = \"0x1234567890123456789012345678901234567890\"\n\n[notifier]\nbot_token = \"t\"\nchat_id = \"1\"\n",
        )
        .unwrap();
        env::set_var("ETHEREUM_RPC", "https://env-rpc.com/");

        let config = AppConfig::load_with_path(temp_file.path().to_str()).unwrap();
        assert_eq!(config.node.endpoint, "https://env-rpc.com/");

        clear_env();
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = AppConfig::load_from_path("/nonexistent/watcher.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_generate_sample_config() {
        let sample = AppConfig::generate_sample_config().unwrap();
        assert!(sample.contains("[node]"));
        assert!(sample.contains("[scanner]"));
        assert!(sample.contains("[price]"));
        assert!(sample.contains("[notifier]"));
        assert!(sample.contains("[logging]"));

        let parsed: AppConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.scanner.poll_interval_seconds, 15);
    }

    #[test]
    fn test_retry_configs() {
        let config = AppConfig::default();
        let node = config.node.retry_config();
        assert_eq!(node.max_attempts, 3);
        assert_eq!(node.delay, Duration::from_secs(2));
        assert_eq!(config.price.retry_config().max_attempts, 3);
        assert_eq!(config.scanner.poll_interval(), Duration::from_secs(15));
    }
}
