use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::NotifierConfig;
use crate::error::{NotifyError, WatcherError};
use crate::logging::{LogContext, PerformanceMonitor};
use crate::models::TransferAlert;
use crate::notify::message::{render, MessageStyle};
use crate::notify::Notifier;

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API channel.
///
/// Posts `sendVideo` with the caption when a media file id is configured,
/// `sendMessage` otherwise. Both carry Markdown parse mode and, when a button
/// URL is set, a single inline link button.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    media_file_id: Option<String>,
    button: Option<(String, String)>,
    style: MessageStyle,
}

impl TelegramNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let button = if config.button_url.is_empty() {
            None
        } else {
            Some((config.button_text.clone(), config.button_url.clone()))
        };

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            media_file_id: config.media_file_id.clone(),
            button,
            style: MessageStyle::from(config),
        })
    }

    pub fn style(&self) -> &MessageStyle {
        &self.style
    }

    /// Post a rendered caption to the chat
    pub async fn send(&self, caption: &str) -> Result<(), NotifyError> {
        let (method, body) = self.build_request(caption);
        // the token is part of the path; never let it reach the logs
        let url = format!("{}/bot{}/{}", self.api_base, self.bot_token, method);

        let monitor = PerformanceMonitor::new("telegram_send").with_metadata("method", json!(method));
        let result = self.post(&url, &body).await;
        monitor.finish_with_result(&result);
        result
    }

    async fn post(&self, url: &str, body: &Value) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| NotifyError::Http(e.without_url()))?;

        match serde_json::from_str::<BotApiResponse>(&text) {
            Ok(reply) if reply.ok && (200..300).contains(&status) => Ok(()),
            Ok(reply) => Err(NotifyError::Rejected {
                status,
                description: reply.description.unwrap_or_default(),
            }),
            Err(_) => Err(NotifyError::Rejected { status, description: text }),
        }
    }

    fn build_request(&self, caption: &str) -> (&'static str, Value) {
        let mut body = json!({
            "chat_id": self.chat_id,
            "parse_mode": "Markdown",
        });

        let method = match &self.media_file_id {
            Some(file_id) => {
                body["video"] = json!(file_id);
                body["caption"] = json!(caption);
                "sendVideo"
            }
            None => {
                body["text"] = json!(caption);
                body["disable_web_page_preview"] = json!(true);
                "sendMessage"
            }
        };

        if let Some((text, url)) = &self.button {
            body["reply_markup"] = json!({
                "inline_keyboard": [[{ "text": text, "url": url }]]
            });
        }

        (method, body)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, alert: &TransferAlert) -> Result<(), WatcherError> {
        let caption = render(alert, &self.style);
        self.send(&caption).await?;

        LogContext::new("telegram", "notify")
            .with_transaction_hash(&alert.event.transaction_hash)
            .debug("Alert delivered");
        Ok(())
    }
}
