//! Bot error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    /// The transport refused or failed to deliver a message
    #[error("Failed to send message to chat {chat_id}: {reason}")]
    SendFailed { chat_id: i64, reason: String },
}

pub type Result<T> = std::result::Result<T, BotError>;
