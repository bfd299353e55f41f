//! Cloud error classification
//!
//! Only the coarse kind is shown to chat users; everything that is not a
//! recognised provider message is logged in full on the server.

use vmbot_cloud::CloudError;

/// User-visible error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The provider does not know the instance ID
    InvalidInstanceId,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidInstanceId => write!(f, "Invalid instance id"),
            ErrorKind::Unknown => write!(f, "An unknown error occurred"),
        }
    }
}

/// Classify a cloud error for display
///
/// Only provider RPC errors are inspected. Their detail string is matched
/// case-sensitively, exactly as the provider emits it.
pub fn classify(err: &CloudError) -> ErrorKind {
    if err.details().is_some_and(is_invalid_instance_id) {
        return ErrorKind::InvalidInstanceId;
    }

    tracing::error!(error = %err, detail = ?err, "Unhandled cloud error");
    ErrorKind::Unknown
}

fn is_invalid_instance_id(details: &str) -> bool {
    details.starts_with("invalid instance id")
        || (details.starts_with("The instance") && details.ends_with("not found"))
}
