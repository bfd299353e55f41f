//! Outbound messaging port

use crate::error::Result;
use async_trait::async_trait;

/// Chat (conversation) identifier
pub type ChatId = i64;

/// Sender identifier
pub type UserId = i64;

/// Markup dialect of an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    #[default]
    Plain,
    /// Telegram MarkdownV2; dynamic text must go through [`crate::markdown`]
    MarkdownV2,
}

/// A message to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub parse_mode: ParseMode,
}

impl OutgoingMessage {
    pub fn plain(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: ParseMode::Plain,
        }
    }

    pub fn markdown(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: ParseMode::MarkdownV2,
        }
    }
}

/// Chat transport abstraction
///
/// One messenger is shared by the dispatcher and every tracker task, so
/// implementations must accept concurrent sends.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, message: OutgoingMessage) -> Result<()>;
}
