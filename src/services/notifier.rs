//! Alert delivery.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Outbound message channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `recipient`.
    async fn send(&self, recipient: &str, text: &str) -> Result<()>;
}

/// Build the alert text for a changed target.
///
/// At most `max_listed` new documents are listed, one bullet per line.
pub fn format_alert(target: &str, new_documents: &[String], max_listed: usize) -> String {
    let mut message = format!("⚠️ Page updated!\n👉 {target}");
    if !new_documents.is_empty() {
        let list = new_documents
            .iter()
            .take(max_listed)
            .map(|doc| format!("• {doc}"))
            .collect::<Vec<_>>()
            .join("\n");
        message.push_str("\n\nNew PDFs detected:\n");
        message.push_str(&list);
    }
    message
}

/// Sends alerts through the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    pub fn new(client: Client, api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, recipient: &str, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: recipient,
            text,
            disable_web_page_preview: true,
        };

        // Errors are stripped of the URL: it carries the bot token.
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::notification(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::notification(format!(
                "Telegram returned {status}: {detail}"
            )));
        }
        Ok(())
    }
}

/// Writes alerts to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, text: &str) -> Result<()> {
        log::info!("[dry-run alert to {}]\n{}", recipient, text);
        Ok(())
    }
}
