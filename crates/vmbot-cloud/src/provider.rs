//! Compute client trait definition

use crate::error::Result;
use crate::instance::Instance;
use crate::operation::Operation;
use async_trait::async_trait;

/// Compute instance client abstraction
///
/// Providers implement this trait so the bot can observe and power-cycle an
/// instance without knowing the provider API. Implementations perform the
/// remote call and nothing else: failures are returned as-is and are
/// interpreted by the caller.
#[async_trait]
pub trait InstanceClient: Send + Sync {
    /// Returns the provider name (e.g., "yandex-cloud")
    fn name(&self) -> &str;

    /// Fetch a fresh snapshot of an instance
    async fn get_instance(&self, id: &str) -> Result<Instance>;

    /// Request the instance to start
    async fn start_instance(&self, instance: &Instance) -> Result<Operation>;

    /// Request the instance to stop
    async fn stop_instance(&self, instance: &Instance) -> Result<Operation>;

    /// Wait for a start operation and return the refreshed instance
    ///
    /// Blocks the calling task until the provider reports the operation done.
    async fn wait_started(&self, operation: Operation) -> Result<Instance>;

    /// Wait for a stop operation to complete
    async fn wait_stopped(&self, operation: Operation) -> Result<()>;
}
