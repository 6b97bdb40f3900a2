//! Telegram Bot API delivery — message sending via `sendMessage`.

use async_trait::async_trait;
use serde::Deserialize;

use taskping_core::config::TelegramConfig;
use taskping_core::{DeliveryAdapter, Result, TaskPingError};

/// Telegram delivery adapter. One shared `reqwest` client; every call is
/// bounded by the configured timeout so a stuck delivery cannot stall a
/// whole pass.
pub struct TelegramDelivery {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramDelivery {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{}",
            self.config.bot_token, method
        )
    }

    /// Send a text message to a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .timeout(std::time::Duration::from_secs(self.config.send_timeout_secs))
            .send()
            .await
            .map_err(|e| TaskPingError::Channel(format!("sendMessage failed: {e}")))?;

        let result: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| TaskPingError::Channel(format!("invalid send response: {e}")))?;

        if !result.ok {
            return Err(TaskPingError::Channel(format!(
                "send rejected: {}",
                result.description.unwrap_or_default()
            )));
        }
        tracing::debug!(chat_id, "telegram message sent");
        Ok(())
    }

    /// Verify the bot token by calling `getMe`.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        let response = self
            .client
            .get(self.api_url("getMe"))
            .timeout(std::time::Duration::from_secs(self.config.send_timeout_secs))
            .send()
            .await
            .map_err(|e| TaskPingError::Channel(format!("getMe failed: {e}")))?;
        let body: TelegramApiResponse<TelegramUser> = response
            .json()
            .await
            .map_err(|e| TaskPingError::Channel(format!("invalid getMe response: {e}")))?;
        body.result
            .ok_or_else(|| TaskPingError::Channel("no bot info".into()))
    }
}

#[async_trait]
impl DeliveryAdapter for TelegramDelivery {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await
    }
}

// --- Telegram API types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_embeds_token_and_method() {
        let delivery = TelegramDelivery::new(TelegramConfig {
            bot_token: "123:abc".into(),
            send_timeout_secs: 10,
        });
        assert_eq!(
            delivery.api_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn api_error_response_deserializes() {
        let raw = r#"{"ok": false, "description": "Bad Request: chat not found"}"#;
        let parsed: TelegramApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
        assert!(!parsed.ok);
        assert_eq!(
            parsed.description.as_deref(),
            Some("Bad Request: chat not found")
        );
    }
}
