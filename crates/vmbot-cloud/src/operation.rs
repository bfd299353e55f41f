//! Provider-tracked asynchronous operations

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};

/// Handle for an asynchronous action started by a mutating call
///
/// Each start/stop request gets exactly one operation; the handle is moved
/// into the task that waits for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Provider operation ID
    pub id: String,

    /// Description supplied by the provider (e.g. "Start instance")
    pub description: String,

    /// Whether the operation has reached a terminal state
    pub done: bool,

    /// Failure details, set when the operation finished with an error
    pub error: Option<OperationError>,

    /// Result payload, set when the operation finished successfully
    pub response: Option<serde_json::Value>,
}

impl Operation {
    pub fn pending(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            done: false,
            error: None,
            response: None,
        }
    }

    /// Consume a finished operation, yielding its response payload
    pub fn into_result(self) -> Result<Option<serde_json::Value>> {
        if !self.done {
            return Err(CloudError::UnexpectedResponse(format!(
                "operation {} is still running",
                self.id
            )));
        }
        match self.error {
            Some(err) => Err(CloudError::rpc(err.code, err.message)),
            None => Ok(self.response),
        }
    }
}

/// Error attached to a failed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    pub code: i32,
    pub message: String,
}
