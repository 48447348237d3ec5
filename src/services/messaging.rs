use crate::models::Reply;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

/// LINE caps a single text message at 5000 characters.
pub const MAX_TEXT_CHARS: usize = 5000;

#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<()>;
    async fn reply_image(&self, reply_token: &str, url: &str, preview_url: &str) -> Result<()>;
    /// Raw bytes of an image or file the user sent.
    async fn fetch_message_content(&self, message_id: &str) -> Result<Vec<u8>>;

    async fn send_reply(&self, reply_token: &str, reply: &Reply) -> Result<()> {
        match reply {
            Reply::Text(text) => self.reply_text(reply_token, text).await,
            Reply::Image {
                original_url,
                preview_url,
            } => self.reply_image(reply_token, original_url, preview_url).await,
        }
    }
}

/// Messaging API client for a single LINE channel.
pub struct LineMessagingClient {
    http: reqwest::Client,
    channel_token: String,
    api_base: String,
    data_api_base: String,
}

impl LineMessagingClient {
    pub fn new(
        channel_token: String,
        api_base: String,
        data_api_base: String,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            channel_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            data_api_base: data_api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn reply(&self, reply_token: &str, message: Value) -> Result<()> {
        let res = self
            .http
            .post(format!("{}/v2/bot/message/reply", self.api_base))
            .bearer_auth(&self.channel_token)
            .json(&json!({
                "replyToken": reply_token,
                "messages": [message],
            }))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("LINE reply failed with status {}: {}", status, body);
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingClient for LineMessagingClient {
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<()> {
        self.reply(reply_token, text_message(text)).await
    }

    async fn reply_image(&self, reply_token: &str, url: &str, preview_url: &str) -> Result<()> {
        self.reply(reply_token, image_message(url, preview_url)).await
    }

    async fn fetch_message_content(&self, message_id: &str) -> Result<Vec<u8>> {
        let res = self
            .http
            .get(format!(
                "{}/v2/bot/message/{}/content",
                self.data_api_base, message_id
            ))
            .bearer_auth(&self.channel_token)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("LINE content fetch for {} failed with status {}", message_id, status);
        }
        Ok(res.bytes().await?.to_vec())
    }
}

fn text_message(text: &str) -> Value {
    json!({
        "type": "text",
        "text": truncate_chars(text, MAX_TEXT_CHARS),
    })
}

fn image_message(url: &str, preview_url: &str) -> Value {
    json!({
        "type": "image",
        "originalContentUrl": url,
        "previewImageUrl": preview_url,
    })
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
