//! Minimal Telegram Bot API client. Both the review notifications and the
//! forwarded log records deliver through it, each with its own bot token.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::notify::Notifier;

const TELEGRAM_ORIGIN: &str = "https://api.telegram.org";

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Blocking client for one bot.
///
/// The bot token rides in the URL path, so every reqwest error is stripped
/// with `without_url` before it can reach a log line.
pub struct TelegramBot {
    origin: String,
    token: String,
    client: Client,
}

#[derive(Deserialize)]
struct SendReply {
    ok: bool,
    description: Option<String>,
}

impl TelegramBot {
    /// Bot client against the production origin.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_origin(token, TELEGRAM_ORIGIN)
    }

    /// Bot client against an alternate origin (local fixtures in tests).
    pub fn with_origin(token: impl Into<String>, origin: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build the Telegram HTTP client")?;

        Ok(Self {
            origin: origin.into(),
            token: token.into(),
            client,
        })
    }

    /// Send a plain-text message to `chat_id`.
    pub fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.origin, self.token);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .map_err(|err| err.without_url())
            .context("Failed to reach the Telegram Bot API")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Telegram Bot API answered with HTTP {status}");
        }

        let reply: SendReply = response
            .json()
            .map_err(|err| err.without_url())
            .context("Failed to decode the Telegram Bot API reply")?;
        if !reply.ok {
            bail!(
                "Telegram rejected the message: {}",
                reply
                    .description
                    .unwrap_or_else(|| "no description given".to_string())
            );
        }

        Ok(())
    }
}

/// [`Notifier`] bound to one bot and one fixed chat.
pub struct TelegramNotifier {
    bot: TelegramBot,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot: TelegramBot, chat_id: impl Into<String>) -> Self {
        Self {
            bot,
            chat_id: chat_id.into(),
        }
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, text: &str) -> Result<()> {
        self.bot.send_message(&self.chat_id, text)
    }
}
