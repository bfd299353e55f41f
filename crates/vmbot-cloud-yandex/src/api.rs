//! Yandex Cloud REST wire types
//!
//! Payloads as returned by the Compute and Operation APIs, converted into the
//! provider-neutral types of `vmbot-cloud`.

use crate::error::YandexError;
use serde::{Deserialize, Serialize};
use vmbot_cloud::{Instance, NetworkInterface, Operation, OperationError, Status};

/// Instance resource from `compute/v1/instances/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInstance {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub status: Option<Status>,

    #[serde(default)]
    pub network_interfaces: Vec<ApiNetworkInterface>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNetworkInterface {
    #[serde(default)]
    pub primary_v4_address: Option<ApiPrimaryAddress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPrimaryAddress {
    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub one_to_one_nat: Option<ApiOneToOneNat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiOneToOneNat {
    #[serde(default)]
    pub address: Option<String>,
}

impl From<ApiInstance> for Instance {
    fn from(api: ApiInstance) -> Self {
        Self {
            id: api.id,
            name: api.name,
            status: api.status.unwrap_or(Status::Unspecified),
            network_interfaces: api
                .network_interfaces
                .into_iter()
                .map(NetworkInterface::from)
                .collect(),
        }
    }
}

impl From<ApiNetworkInterface> for NetworkInterface {
    fn from(api: ApiNetworkInterface) -> Self {
        let primary = api.primary_v4_address;
        Self {
            internal_ipv4: primary.as_ref().and_then(|p| p.address.clone()),
            external_ipv4: primary
                .and_then(|p| p.one_to_one_nat)
                .and_then(|nat| nat.address),
        }
    }
}

/// `google.rpc.Status`-shaped error, used both for failed operations and
/// for error response bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub code: i32,

    #[serde(default)]
    pub message: String,
}

impl From<ApiStatus> for YandexError {
    fn from(status: ApiStatus) -> Self {
        YandexError::Api {
            code: status.code,
            message: status.message,
        }
    }
}

/// Operation resource from `operations/{id}` and mutating calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiOperation {
    pub id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub done: bool,

    #[serde(default)]
    pub error: Option<ApiStatus>,

    #[serde(default)]
    pub response: Option<serde_json::Value>,
}

impl From<ApiOperation> for Operation {
    fn from(api: ApiOperation) -> Self {
        Self {
            id: api.id,
            description: api.description,
            done: api.done,
            error: api.error.map(|e| OperationError {
                code: e.code,
                message: e.message,
            }),
            response: api.response,
        }
    }
}

/// Build an error from a non-success HTTP response
///
/// Falls back to the HTTP status code when the body is not a status object.
pub fn error_from_body(http_status: u16, body: &str) -> YandexError {
    match serde_json::from_str::<ApiStatus>(body) {
        Ok(status) if !status.message.is_empty() => status.into(),
        _ => YandexError::Api {
            code: i32::from(http_status),
            message: body.trim().to_string(),
        },
    }
}
