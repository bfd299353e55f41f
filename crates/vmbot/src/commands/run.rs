use super::ConfigPaths;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use vmbot_cloud::InstanceClient;
use vmbot_cloud_yandex::{Credentials, YandexCompute};
use vmbot_core::{Notifier, Router};
use vmbot_telegram::{TelegramClient, UpdatePoller};

/// Pause after a failed getUpdates call
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Run the dispatcher until Ctrl-C
///
/// Commands are handled one at a time in arrival order; start/stop
/// completion is reported by background trackers.
pub async fn handle(paths: &ConfigPaths) -> anyhow::Result<()> {
    let loaded = super::load(paths)?;
    let config = loaded.config;

    let compute: Arc<dyn InstanceClient> =
        Arc::new(YandexCompute::new(Credentials::ServiceAccount(loaded.key)));
    let telegram = Arc::new(TelegramClient::new(config.token.clone()));
    let notifier = Notifier::new(telegram.clone(), config.notify_cid);

    tracing::info!(
        provider = compute.name(),
        users = config.whitelist.len(),
        broadcast = ?config.notify_cid,
        "vmbot {} started",
        env!("CARGO_PKG_VERSION")
    );

    let router = Router::new(compute, notifier, config.whitelist);
    let mut poller = UpdatePoller::new();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Shutting down");
                break;
            }
            batch = poller.next_batch(&telegram) => match batch {
                Ok(requests) => {
                    for request in requests {
                        router.handle(request).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to fetch updates, retrying in {:?}",
                        RETRY_DELAY
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    if !router.in_flight().is_empty() {
        tracing::warn!("Exiting with operations still in progress");
    }
    Ok(())
}
