//! Notification sink
//!
//! Every message the bot produces leaves through a [`Notifier`]: replies to
//! the requesting chat and announcements to the optional broadcast chat.

use crate::markdown;
use crate::messenger::{ChatId, Messenger, OutgoingMessage};
use std::sync::Arc;
use vmbot_cloud::PowerAction;

#[derive(Clone)]
pub struct Notifier {
    messenger: Arc<dyn Messenger>,
    broadcast: Option<ChatId>,
}

impl Notifier {
    pub fn new(messenger: Arc<dyn Messenger>, broadcast: Option<ChatId>) -> Self {
        Self {
            messenger,
            broadcast,
        }
    }

    /// Plain text reply
    pub async fn reply(&self, chat_id: ChatId, text: impl Into<String>) {
        self.deliver(OutgoingMessage::plain(chat_id, text)).await;
    }

    /// MarkdownV2 reply; the caller escapes dynamic parts
    pub async fn reply_markdown(&self, chat_id: ChatId, text: impl Into<String>) {
        self.deliver(OutgoingMessage::markdown(chat_id, text)).await;
    }

    /// Tell the broadcast chat that an action was requested
    ///
    /// No-op when no broadcast chat is configured.
    pub async fn announce(&self, instance_id: &str, action: PowerAction) {
        let Some(chat_id) = self.broadcast else {
            return;
        };
        let text = format!(
            "⚠️ {} was {}",
            markdown::code(instance_id),
            action.past_tense()
        );
        self.deliver(OutgoingMessage::markdown(chat_id, text)).await;
    }

    async fn deliver(&self, message: OutgoingMessage) {
        let chat_id = message.chat_id;
        if let Err(e) = self.messenger.send(message).await {
            tracing::warn!(chat_id, error = %e, "Failed to deliver message");
        }
    }
}
