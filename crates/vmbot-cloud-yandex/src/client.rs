//! Yandex Cloud Compute client implementation

use crate::api::{ApiInstance, ApiOperation, error_from_body};
use crate::auth::{Credentials, IamAuth};
use crate::error::{Result, YandexError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use vmbot_cloud::{Instance, InstanceClient, Operation};

const COMPUTE_API_BASE: &str = "https://compute.api.cloud.yandex.net/compute/v1";
const OPERATION_API_BASE: &str = "https://operation.api.cloud.yandex.net";
const IAM_TOKEN_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// API base URLs
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub compute: String,
    pub operation: String,
    pub iam_token: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            compute: COMPUTE_API_BASE.to_string(),
            operation: OPERATION_API_BASE.to_string(),
            iam_token: IAM_TOKEN_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn instance_url(&self, id: &str) -> String {
        format!("{}/instances/{}", self.compute, id)
    }

    pub fn instance_action_url(&self, id: &str, action: &str) -> String {
        format!("{}/instances/{}:{}", self.compute, id, action)
    }

    pub fn operation_url(&self, id: &str) -> String {
        format!("{}/operations/{}", self.operation, id)
    }
}

/// Check that `id` can be used as a single URL path segment
///
/// Resource ids are lowercase alphanumerics; anything that could change the
/// request path is refused.
pub fn check_instance_id(id: &str) -> Result<&str> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(YandexError::InvalidInstanceId(id.to_string()));
    }
    Ok(id)
}

/// Yandex Cloud Compute client
pub struct YandexCompute {
    http: reqwest::Client,
    auth: IamAuth,
    endpoints: Endpoints,
    poll_interval: Duration,
}

impl YandexCompute {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_endpoints(credentials, Endpoints::default())
    }

    pub fn with_endpoints(credentials: Credentials, endpoints: Endpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth: IamAuth::new(credentials, endpoints.iam_token.clone()),
            endpoints,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Interval between two operation polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        let token = self.auth.token(&self.http).await?;
        let request = self.http.get(url).bearer_auth(token);
        Self::send(request).await
    }

    async fn post_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("POST {}", url);
        let token = self.auth.token(&self.http).await?;
        let request = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({}));
        Self::send(request).await
    }

    async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the current state of an operation
    pub async fn get_operation(&self, id: &str) -> Result<Operation> {
        let api: ApiOperation = self.get_json(&self.endpoints.operation_url(id)).await?;
        Ok(api.into())
    }

    /// Poll an operation until it is done and return its response payload
    pub async fn wait_operation(
        &self,
        operation: Operation,
    ) -> vmbot_cloud::Result<Option<serde_json::Value>> {
        let mut operation = operation;
        while !operation.done {
            tokio::time::sleep(self.poll_interval).await;
            operation = self.get_operation(&operation.id).await?;
        }

        tracing::debug!("Operation {} ({}) done", operation.id, operation.description);
        operation.into_result()
    }

    async fn power(&self, instance: &Instance, action: &str) -> Result<Operation> {
        let id = check_instance_id(&instance.id)?;
        let api: ApiOperation = self
            .post_json(&self.endpoints.instance_action_url(id, action))
            .await?;
        tracing::info!(
            "Requested {} of instance {} (operation {})",
            action,
            instance.id,
            api.id
        );
        Ok(api.into())
    }
}

#[async_trait]
impl InstanceClient for YandexCompute {
    fn name(&self) -> &str {
        "yandex-cloud"
    }

    async fn get_instance(&self, id: &str) -> vmbot_cloud::Result<Instance> {
        let id = check_instance_id(id)?;
        let api: ApiInstance = self.get_json(&self.endpoints.instance_url(id)).await?;
        Ok(api.into())
    }

    async fn start_instance(&self, instance: &Instance) -> vmbot_cloud::Result<Operation> {
        Ok(self.power(instance, "start").await?)
    }

    async fn stop_instance(&self, instance: &Instance) -> vmbot_cloud::Result<Operation> {
        Ok(self.power(instance, "stop").await?)
    }

    async fn wait_started(&self, operation: Operation) -> vmbot_cloud::Result<Instance> {
        let response = self.wait_operation(operation).await?.ok_or_else(|| {
            vmbot_cloud::CloudError::UnexpectedResponse(
                "start operation finished without an instance".to_string(),
            )
        })?;
        let api: ApiInstance = serde_json::from_value(response)?;
        Ok(api.into())
    }

    async fn wait_stopped(&self, operation: Operation) -> vmbot_cloud::Result<()> {
        self.wait_operation(operation).await?;
        Ok(())
    }
}
