//! Telegram Bot API notifier.
//!
//! Text goes to `sendMessage` as a form; photos go to `sendPhoto` as a
//! multipart upload with the JPEG attached as `photo`.

use crate::error::{NotifyError, Result};
use crate::notifier::Notifier;
use reqwest::multipart::{Form, Part};
use safelatch_core::Frame;
use safelatch_core::config::NotifierConfig;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("safelatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Notifier posting to a Telegram chat through a bot.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http_client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Build from the `[notifier]` section.
    ///
    /// # Errors
    /// Returns `NotifyError::Config` if the bot token or chat id is missing.
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        let (token, chat_id) = config
            .credentials()
            .map_err(|e| NotifyError::Config(e.to_string()))?;
        Self::new(config.api_base.clone(), token, chat_id, config.timeout())
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    async fn check(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ApiResponse>(&body).ok();

        if !status.is_success() || parsed.as_ref().is_some_and(|r| !r.ok) {
            let description = parsed
                .and_then(|r| r.description)
                .unwrap_or(body);
            return Err(NotifyError::api(status.as_u16(), description));
        }
        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    async fn notify_text(&self, message: &str) -> Result<()> {
        debug!(len = message.len(), "Sending Telegram message");

        let params = [("chat_id", self.chat_id.as_str()), ("text", message)];
        let response = self
            .http_client
            .post(self.method_url("sendMessage"))
            .form(&params)
            .send()
            .await?;

        Self::check(response).await
    }

    async fn notify_photo(&self, frame: &Frame, caption: &str) -> Result<()> {
        debug!(bytes = frame.data.len(), "Sending Telegram photo");

        let photo = Part::bytes(frame.data.to_vec())
            .file_name("capture.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .part("photo", photo);

        let response = self
            .http_client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;

        Self::check(response).await
    }
}
