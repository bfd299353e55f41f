//! Bot API client

use crate::api::{ApiResponse, GetUpdates, SendMessage, Update};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use vmbot_core::{BotError, Messenger, OutgoingMessage, Request};

const API_BASE: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Telegram Bot API client
///
/// Used both for long polling and as the bot's [`Messenger`].
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    poll_timeout: u64,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, API_BASE)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
            poll_timeout: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }

    /// Long polling timeout in seconds
    pub fn with_poll_timeout(mut self, secs: u64) -> Self {
        self.poll_timeout = secs;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<P: Serialize, T: DeserializeOwned>(&self, method: &str, params: &P) -> Result<T> {
        // never log the URL: it carries the token
        tracing::trace!("Bot API call {}", method);
        let response = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await?;
        let body = response.text().await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
        envelope.into_result()
    }

    /// Fetch pending updates, blocking up to the poll timeout
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let params = GetUpdates {
            offset,
            timeout: self.poll_timeout,
            allowed_updates: vec!["message"],
        };
        self.call("getUpdates", &params).await
    }

    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<()> {
        let _sent: serde_json::Value = self
            .call("sendMessage", &SendMessage::from(message))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send(&self, message: OutgoingMessage) -> vmbot_core::Result<()> {
        self.send_message(&message)
            .await
            .map_err(|e| BotError::SendFailed {
                chat_id: message.chat_id,
                reason: e.to_string(),
            })
    }
}

/// Offset-tracking update poller
///
/// Each batch acknowledges the previous one, so an update is handed out at
/// most once.
#[derive(Debug, Default)]
pub struct UpdatePoller {
    offset: Option<i64>,
}

impl UpdatePoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Fetch the next batch and convert it into requests
    pub async fn next_batch(&mut self, client: &TelegramClient) -> Result<Vec<Request>> {
        let updates = client.get_updates(self.offset).await?;
        Ok(self.accept(updates))
    }

    fn accept(&mut self, updates: Vec<Update>) -> Vec<Request> {
        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset = Some(last + 1);
        }
        let total = updates.len();
        let requests: Vec<Request> = updates
            .into_iter()
            .filter_map(Update::into_request)
            .collect();
        if requests.len() < total {
            tracing::debug!("Ignored {} non-command updates", total - requests.len());
        }
        requests
    }
}
