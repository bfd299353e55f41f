//! Command router
//!
//! Handles one inbound [`Request`] at a time: checks the allow-list, fetches
//! a fresh instance snapshot, rejects no-op transitions, issues the mutating
//! call and hands the resulting operation to a detached tracker. Every
//! failure ends as a reply; nothing escapes [`Router::handle`].

use crate::classify::classify;
use crate::command::{CommandKind, Request};
use crate::inflight::InFlight;
use crate::markdown;
use crate::messenger::{ChatId, UserId};
use crate::notify::Notifier;
use crate::tracker::{self, TrackJob};
use std::collections::HashSet;
use std::sync::Arc;
use vmbot_cloud::{Instance, InstanceClient, PowerAction, Status};

pub const COMMAND_LIST: &str = "Available commands: /status, /get_ip, /start_vm, /stop_vm";

pub struct Router {
    client: Arc<dyn InstanceClient>,
    notifier: Notifier,
    allow_list: HashSet<UserId>,
    in_flight: InFlight,
}

impl Router {
    pub fn new(
        client: Arc<dyn InstanceClient>,
        notifier: Notifier,
        allow_list: impl IntoIterator<Item = UserId>,
    ) -> Self {
        Self {
            client,
            notifier,
            allow_list: allow_list.into_iter().collect(),
            in_flight: InFlight::new(),
        }
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    pub fn is_authorized(&self, user: UserId) -> bool {
        self.allow_list.contains(&user)
    }

    /// Handle one command
    ///
    /// Returns once the reply for the command is sent; start/stop completion
    /// is reported later by the tracker.
    pub async fn handle(&self, request: Request) {
        if !self.is_authorized(request.sender) {
            // no reply: do not reveal the bot to strangers
            tracing::warn!("Unauthorized command from user {}", request.sender);
            return;
        }

        let chat_id = request.chat_id;
        let kind = request.command.kind;
        tracing::info!(
            user = request.sender,
            command = kind.name(),
            arg = request.command.arg.as_deref().unwrap_or(""),
            "Handling command"
        );

        if !kind.requires_instance() {
            let text = match kind {
                CommandKind::Start => COMMAND_LIST.to_string(),
                _ => format!("Unknown command. {}", COMMAND_LIST),
            };
            self.notifier.reply(chat_id, text).await;
            return;
        }

        let Some(instance_id) = request.command.arg.as_deref() else {
            self.notifier
                .reply(chat_id, format!("Usage: /{} INSTANCE_ID", kind.name()))
                .await;
            return;
        };

        match kind {
            CommandKind::Status => self.status(chat_id, instance_id).await,
            CommandKind::GetIp => self.get_ip(chat_id, instance_id).await,
            CommandKind::StartVm => self.power(chat_id, instance_id, PowerAction::Start).await,
            _ => self.power(chat_id, instance_id, PowerAction::Stop).await,
        }
    }

    /// Fetch a fresh snapshot, replying with the classified error on failure
    async fn fetch(&self, chat_id: ChatId, instance_id: &str) -> Option<Instance> {
        match self.client.get_instance(instance_id).await {
            Ok(instance) => Some(instance),
            Err(e) => {
                self.notifier
                    .reply(chat_id, classify(&e).to_string())
                    .await;
                None
            }
        }
    }

    async fn status(&self, chat_id: ChatId, instance_id: &str) {
        let Some(instance) = self.fetch(chat_id, instance_id).await else {
            return;
        };
        self.notifier
            .reply(chat_id, format!("Status: {}", instance.status))
            .await;
    }

    async fn get_ip(&self, chat_id: ChatId, instance_id: &str) {
        let Some(instance) = self.fetch(chat_id, instance_id).await else {
            return;
        };
        if !instance.is_running() {
            self.notifier.reply(chat_id, "VM is not running").await;
            return;
        }
        self.notifier
            .reply(chat_id, tracker::ip_text(&instance))
            .await;
    }

    async fn power(&self, chat_id: ChatId, instance_id: &str, action: PowerAction) {
        let Some(instance) = self.fetch(chat_id, instance_id).await else {
            return;
        };

        if let Some(reply) = transition_guard(action, instance.status) {
            self.notifier.reply(chat_id, reply).await;
            return;
        }

        let Some(guard) = self.in_flight.try_acquire(instance_id) else {
            self.notifier
                .reply_markdown(
                    chat_id,
                    format!(
                        "An operation on {} is already in progress",
                        markdown::code(instance_id)
                    ),
                )
                .await;
            return;
        };

        let result = match action {
            PowerAction::Start => self.client.start_instance(&instance).await,
            PowerAction::Stop => self.client.stop_instance(&instance).await,
        };
        let operation = match result {
            Ok(operation) => operation,
            Err(e) => {
                // usually the instance changed state since the snapshot
                tracing::warn!(instance_id, error = %e, "Failed to {} instance", action);
                self.notifier.reply(chat_id, rejected_reply(action)).await;
                return;
            }
        };

        tracing::info!(
            instance_id,
            operation_id = %operation.id,
            "Instance {} requested",
            action.progressive()
        );
        self.notifier
            .reply(chat_id, format!("VM is {}...", action.progressive()))
            .await;

        // detached: the dispatcher does not wait for completion
        let _ = tracker::spawn(
            Arc::clone(&self.client),
            self.notifier.clone(),
            TrackJob {
                action,
                instance_id: instance_id.to_string(),
                chat_id,
                operation,
                guard: Some(guard),
            },
        );

        self.notifier.announce(instance_id, action).await;
    }
}

/// Reply for a request that would not change anything
fn transition_guard(action: PowerAction, status: Status) -> Option<&'static str> {
    match (action, status) {
        (PowerAction::Start, Status::Running) => Some("VM is already running"),
        (PowerAction::Start, Status::Provisioning) => Some("VM is already starting"),
        (PowerAction::Stop, Status::Stopped) => Some("VM is already stopped"),
        (PowerAction::Stop, Status::Stopping) => Some("VM is already stopping"),
        _ => None,
    }
}

fn rejected_reply(action: PowerAction) -> &'static str {
    match action {
        PowerAction::Start => "An error occurred, maybe the instance is already running",
        PowerAction::Stop => "An error occurred, maybe the instance is already stopped",
    }
}
