//! Asynchronous operation tracker
//!
//! Each accepted start/stop request gets its own task that waits for the
//! provider operation and reports the result to the requester. The
//! dispatcher never waits on these tasks: there is no retry and no
//! cancellation, a tracker always runs until the wait returns.

use crate::inflight::InFlightGuard;
use crate::markdown;
use crate::messenger::ChatId;
use crate::notify::Notifier;
use std::sync::Arc;
use tokio::task::JoinHandle;
use vmbot_cloud::{Instance, InstanceClient, Operation, PowerAction};

/// Terminal state of a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerOutcome {
    Succeeded,
    Failed,
}

/// Everything a tracker task owns
#[derive(Debug)]
pub struct TrackJob {
    pub action: PowerAction,
    pub instance_id: String,
    /// Chat of the original requester
    pub chat_id: ChatId,
    pub operation: Operation,
    /// Held until the task finishes
    pub guard: Option<InFlightGuard>,
}

/// Spawn a detached tracker task
///
/// The returned handle may be dropped; the task keeps running.
pub fn spawn(
    client: Arc<dyn InstanceClient>,
    notifier: Notifier,
    job: TrackJob,
) -> JoinHandle<TrackerOutcome> {
    tokio::spawn(async move { track(client.as_ref(), &notifier, job).await })
}

/// Wait for the job's operation and report the outcome
pub async fn track(
    client: &dyn InstanceClient,
    notifier: &Notifier,
    job: TrackJob,
) -> TrackerOutcome {
    let TrackJob {
        action,
        instance_id,
        chat_id,
        operation,
        guard,
    } = job;

    tracing::debug!(
        instance_id = %instance_id,
        operation_id = %operation.id,
        "Polling {} operation",
        action
    );

    let outcome = match action {
        PowerAction::Start => match client.wait_started(operation).await {
            Ok(instance) => report_started(notifier, chat_id, &instance_id, &instance).await,
            Err(e) => {
                tracing::error!(
                    instance_id = %instance_id,
                    error = %e,
                    detail = ?e,
                    "Start operation failed"
                );
                notifier
                    .reply_markdown(
                        chat_id,
                        format!(
                            "An unknown error occurred while starting {}",
                            markdown::code(&instance_id)
                        ),
                    )
                    .await;
                TrackerOutcome::Failed
            }
        },
        PowerAction::Stop => match client.wait_stopped(operation).await {
            Ok(()) => {
                notifier
                    .reply_markdown(
                        chat_id,
                        format!("Stopped {}", markdown::code(&instance_id)),
                    )
                    .await;
                TrackerOutcome::Succeeded
            }
            Err(e) => {
                tracing::error!(
                    instance_id = %instance_id,
                    error = %e,
                    detail = ?e,
                    "Stop operation failed"
                );
                notifier
                    .reply_markdown(
                        chat_id,
                        format!(
                            "An unknown error occurred while stopping {}",
                            markdown::code(&instance_id)
                        ),
                    )
                    .await;
                TrackerOutcome::Failed
            }
        },
    };

    drop(guard);
    tracing::info!(instance_id = %instance_id, ?outcome, "{} operation finished", action);
    outcome
}

async fn report_started(
    notifier: &Notifier,
    chat_id: ChatId,
    instance_id: &str,
    instance: &Instance,
) -> TrackerOutcome {
    if !instance.is_running() {
        notifier
            .reply_markdown(
                chat_id,
                format!(
                    "{} failed to start or was stopped",
                    markdown::code(instance_id)
                ),
            )
            .await;
        return TrackerOutcome::Failed;
    }

    let text = format!(
        "{} is now running \\({}\\)",
        markdown::code(instance_id),
        markdown::escape(&ip_text(instance))
    );
    notifier.reply_markdown(chat_id, text).await;
    TrackerOutcome::Succeeded
}

/// "IP: <addr>" or "No external IP"
pub fn ip_text(instance: &Instance) -> String {
    match instance.external_ip() {
        Some(ip) => format!("IP: {}", ip),
        None => "No external IP".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inflight::InFlight;
    use crate::messenger::ParseMode;
    use crate::testing::{FakeCompute, RecordingMessenger};
    use vmbot_cloud::{NetworkInterface, Status};

    fn job(action: PowerAction, guard: Option<InFlightGuard>) -> TrackJob {
        TrackJob {
            action,
            instance_id: "fhm1".to_string(),
            chat_id: 42,
            operation: Operation::pending("op1", "test"),
            guard,
        }
    }

    #[tokio::test]
    async fn test_start_reports_escaped_ip() {
        let compute = FakeCompute::new();
        compute.set_started_instance(
            Instance::new("fhm1", Status::Running)
                .with_interface(NetworkInterface::external("5.6.7.8")),
        );
        let messenger = Arc::new(RecordingMessenger::new());
        let notifier = Notifier::new(messenger.clone(), None);

        let outcome = track(&compute, &notifier, job(PowerAction::Start, None)).await;

        assert_eq!(outcome, TrackerOutcome::Succeeded);
        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, 42);
        assert_eq!(sent[0].parse_mode, ParseMode::MarkdownV2);
        assert_eq!(sent[0].text, r"`fhm1` is now running \(IP: 5\.6\.7\.8\)");
    }

    #[tokio::test]
    async fn test_start_without_external_ip() {
        let compute = FakeCompute::new();
        compute.set_started_instance(Instance::new("fhm1", Status::Running));
        let messenger = Arc::new(RecordingMessenger::new());
        let notifier = Notifier::new(messenger.clone(), None);

        track(&compute, &notifier, job(PowerAction::Start, None)).await;

        assert_eq!(
            messenger.sent()[0].text,
            r"`fhm1` is now running \(No external IP\)"
        );
    }

    #[tokio::test]
    async fn test_start_ending_not_running() {
        let compute = FakeCompute::new();
        compute.set_started_instance(Instance::new("fhm1", Status::Stopped));
        let messenger = Arc::new(RecordingMessenger::new());
        let notifier = Notifier::new(messenger.clone(), None);

        let outcome = track(&compute, &notifier, job(PowerAction::Start, None)).await;

        assert_eq!(outcome, TrackerOutcome::Failed);
        assert_eq!(
            messenger.sent()[0].text,
            "`fhm1` failed to start or was stopped"
        );
    }

    #[tokio::test]
    async fn test_wait_failure_replies_unknown_error() {
        let compute = FakeCompute::new();
        compute.fail_waits();
        let messenger = Arc::new(RecordingMessenger::new());
        let notifier = Notifier::new(messenger.clone(), None);

        let start = track(&compute, &notifier, job(PowerAction::Start, None)).await;
        let stop = track(&compute, &notifier, job(PowerAction::Stop, None)).await;

        assert_eq!(start, TrackerOutcome::Failed);
        assert_eq!(stop, TrackerOutcome::Failed);
        let texts: Vec<_> = messenger.sent().into_iter().map(|m| m.text).collect();
        assert_eq!(
            texts,
            vec![
                "An unknown error occurred while starting `fhm1`",
                "An unknown error occurred while stopping `fhm1`",
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_confirms_and_releases_guard() {
        let compute = FakeCompute::new();
        let messenger = Arc::new(RecordingMessenger::new());
        let notifier = Notifier::new(messenger.clone(), None);
        let in_flight = InFlight::new();
        let guard = in_flight.try_acquire("fhm1");

        let outcome = track(&compute, &notifier, job(PowerAction::Stop, guard)).await;

        assert_eq!(outcome, TrackerOutcome::Succeeded);
        assert_eq!(messenger.sent()[0].text, "Stopped `fhm1`");
        assert!(in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_spawned_tracker_runs_detached() {
        let compute = Arc::new(FakeCompute::new());
        let messenger = Arc::new(RecordingMessenger::new());
        let notifier = Notifier::new(messenger.clone(), None);

        drop(spawn(compute, notifier, job(PowerAction::Stop, None)));

        let sent = messenger.wait_for(1).await;
        assert_eq!(sent[0].text, "Stopped `fhm1`");
    }
}
