//! Cloud provider error types

use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    /// Structured error reported by the provider API.
    ///
    /// `details` is the provider's human readable message, verbatim.
    #[error("RPC error (code {code}): {details}")]
    Rpc { code: i32, details: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn rpc(code: i32, details: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            details: details.into(),
        }
    }

    /// Provider detail string, only present for [`CloudError::Rpc`]
    pub fn details(&self) -> Option<&str> {
        match self {
            CloudError::Rpc { details, .. } => Some(details),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
