pub mod message;
pub mod telegram;

use async_trait::async_trait;

use crate::error::WatcherError;
use crate::models::TransferAlert;

pub use message::MessageStyle;
pub use telegram::TelegramNotifier;

/// Delivers one alert to the external channel. Failures are reported, not
/// retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &TransferAlert) -> Result<(), WatcherError>;
}
