//! Yandex Cloud provider error types

use thiserror::Error;
use vmbot_cloud::CloudError;

#[derive(Error, Debug)]
pub enum YandexError {
    /// Error body returned by a Yandex Cloud API
    #[error("Yandex Cloud API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Rejected before any request is made
    #[error("invalid instance id: {0:?}")]
    InvalidInstanceId(String),

    #[error("Invalid service account key: {0}")]
    InvalidKey(String),

    #[error("IAM token exchange failed: {0}")]
    TokenExchange(String),

    #[error("JWT signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, YandexError>;

/// gRPC status code the API uses for malformed arguments
const INVALID_ARGUMENT: i32 = 3;

impl From<YandexError> for CloudError {
    fn from(err: YandexError) -> Self {
        match err {
            YandexError::Api { code, message } => CloudError::Rpc {
                code,
                details: message,
            },
            e @ YandexError::InvalidInstanceId(_) => CloudError::Rpc {
                code: INVALID_ARGUMENT,
                details: e.to_string(),
            },
            YandexError::InvalidKey(msg) => CloudError::InvalidConfig(msg),
            e @ (YandexError::TokenExchange(_) | YandexError::Jwt(_)) => {
                CloudError::AuthenticationFailed(e.to_string())
            }
            YandexError::Http(e) => CloudError::Transport(e.to_string()),
            YandexError::JsonError(e) => CloudError::Json(e),
        }
    }
}
