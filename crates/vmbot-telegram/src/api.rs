//! Bot API wire types
//!
//! Only the fields the bot reads are modelled; everything else in an update
//! is ignored.

use crate::error::{Result, TelegramError};
use serde::{Deserialize, Serialize};
use vmbot_core::{Command, OutgoingMessage, ParseMode, Request};

/// Envelope of every Bot API answer
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i32>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T> {
        if !self.ok {
            return Err(TelegramError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        self.result.ok_or(TelegramError::EmptyResult)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Update {
    /// Convert into a bot request
    ///
    /// Only commands sent in private chats are accepted; anything else
    /// yields `None`.
    pub fn into_request(self) -> Option<Request> {
        let message = self.message?;
        if message.chat.kind != "private" {
            return None;
        }
        let sender = message.from?.id;
        let command = Command::parse(message.text.as_deref()?)?;
        Some(Request {
            sender,
            chat_id: message.chat.id,
            command,
        })
    }
}

/// `getUpdates` parameters
#[derive(Debug, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Long polling timeout in seconds
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

/// `sendMessage` parameters
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
}

impl<'a> From<&'a OutgoingMessage> for SendMessage<'a> {
    fn from(message: &'a OutgoingMessage) -> Self {
        Self {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: match message.parse_mode {
                ParseMode::Plain => None,
                ParseMode::MarkdownV2 => Some("MarkdownV2"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};
    use vmbot_core::CommandKind;

    fn update(chat_type: &str, text: &str) -> Update {
        serde_json::from_value(json!({
            "update_id": 10,
            "message": {
                "message_id": 3,
                "date": 1700000000,
                "from": {"id": 1001, "is_bot": false, "first_name": "Ann"},
                "chat": {"id": 1001, "type": chat_type},
                "text": text
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_private_command_becomes_request() {
        let request = update("private", "/start_vm@vm_bot fhm1 extra")
            .into_request()
            .unwrap();

        assert_eq!(request.sender, 1001);
        assert_eq!(request.chat_id, 1001);
        assert_eq!(request.command.kind, CommandKind::StartVm);
        assert_eq!(request.command.arg.as_deref(), Some("fhm1"));
    }

    #[test]
    fn test_group_and_plain_messages_are_ignored() {
        assert!(update("group", "/status fhm1").into_request().is_none());
        assert!(update("private", "hello").into_request().is_none());
    }

    #[test]
    fn test_update_without_message() {
        let update: Update =
            serde_json::from_value(json!({"update_id": 11, "edited_message": {}})).unwrap();
        assert!(update.into_request().is_none());
    }

    #[test]
    fn test_response_envelope() {
        let ok: ApiResponse<Vec<Update>> =
            serde_json::from_value(json!({"ok": true, "result": []})).unwrap();
        assert_ok!(ok.into_result());

        let failed: ApiResponse<Vec<Update>> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        }))
        .unwrap();
        let err = assert_err!(failed.into_result());
        assert_eq!(err.to_string(), "Telegram API error (401): Unauthorized");
    }

    #[test]
    fn test_send_message_parse_mode() {
        let plain = OutgoingMessage::plain(5, "VM is starting...");
        assert_eq!(
            serde_json::to_value(SendMessage::from(&plain)).unwrap(),
            json!({"chat_id": 5, "text": "VM is starting..."})
        );

        let markdown = OutgoingMessage::markdown(5, "Stopped `fhm1`");
        assert_eq!(
            serde_json::to_value(SendMessage::from(&markdown)).unwrap(),
            json!({"chat_id": 5, "text": "Stopped `fhm1`", "parse_mode": "MarkdownV2"})
        );
    }
}
