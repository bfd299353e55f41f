//! Telegram transport error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    /// `ok: false` answer from the Bot API
    #[error("Telegram API error ({code}): {description}")]
    Api { code: i32, description: String },

    #[error("Telegram API answered without a result")]
    EmptyResult,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TelegramError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = TelegramError::Api {
            code: 400,
            description: "Bad Request: chat not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Telegram API error (400): Bad Request: chat not found"
        );
    }
}
