use std::sync::Arc;
use vmbot_cloud::{Instance, NetworkInterface, Status};
use vmbot_core::testing::{FakeCompute, FakeFailure, LogEvents, RecordingMessenger};
use vmbot_core::{Command, Notifier, ParseMode, Request, Router};

const OWNER: i64 = 1001;
const STRANGER: i64 = 666;
const BROADCAST: i64 = -500;
const VM: &str = "fhm0b28lgfp4tkoa3jl6";

struct Harness {
    compute: Arc<FakeCompute>,
    messenger: Arc<RecordingMessenger>,
    router: Router,
}

impl Harness {
    fn new(broadcast: Option<i64>) -> Self {
        let compute = Arc::new(FakeCompute::new());
        let messenger = Arc::new(RecordingMessenger::new());
        let notifier = Notifier::new(messenger.clone(), broadcast);
        let router = Router::new(compute.clone(), notifier, [OWNER]);
        Self {
            compute,
            messenger,
            router,
        }
    }

    fn with_instance(instance: Instance) -> Self {
        let harness = Self::new(None);
        harness.compute.insert(instance);
        harness
    }

    async fn send(&self, sender: i64, text: &str) {
        let request = Request {
            sender,
            chat_id: sender,
            command: Command::parse(text).unwrap(),
        };
        self.router.handle(request).await;
    }

    fn texts(&self) -> Vec<String> {
        self.messenger.texts()
    }
}

fn running(ip: Option<&str>) -> Instance {
    let instance = Instance::new(VM, Status::Running);
    match ip {
        Some(ip) => instance.with_interface(NetworkInterface::external(ip)),
        None => instance,
    }
}

#[tokio::test]
async fn test_missing_argument_replies_usage_without_remote_calls() {
    let h = Harness::with_instance(running(None));

    for cmd in ["status", "get_ip", "start_vm", "stop_vm"] {
        h.send(OWNER, &format!("/{}", cmd)).await;
    }

    assert_eq!(
        h.texts(),
        vec![
            "Usage: /status INSTANCE_ID",
            "Usage: /get_ip INSTANCE_ID",
            "Usage: /start_vm INSTANCE_ID",
            "Usage: /stop_vm INSTANCE_ID",
        ]
    );
    assert_eq!(h.compute.remote_calls(), 0);
}

#[tokio::test]
async fn test_unauthorized_sender_gets_nothing() {
    let h = Harness::with_instance(Instance::new(VM, Status::Stopped));
    let warnings = LogEvents::warnings();
    let _guard = warnings.install();

    let mut texts = vec!["/start".to_string(), "/reboot".to_string(), "/status".to_string()];
    for cmd in ["status", "get_ip", "start_vm", "stop_vm"] {
        texts.push(format!("/{} {}", cmd, VM));
    }
    for text in &texts {
        h.send(STRANGER, text).await;
    }

    assert_eq!(h.messenger.attempts(), 0);
    assert_eq!(h.compute.remote_calls(), 0);
    // one warning per dropped command
    assert_eq!(warnings.count(), texts.len());
}

#[tokio::test]
async fn test_authorized_commands_log_no_warnings() {
    let h = Harness::with_instance(Instance::new(VM, Status::Stopped));
    let warnings = LogEvents::warnings();
    let _guard = warnings.install();

    h.send(OWNER, "/start").await;
    h.send(OWNER, &format!("/status {}", VM)).await;

    assert_eq!(h.texts().len(), 2);
    assert_eq!(warnings.count(), 0);
}

#[tokio::test]
async fn test_command_names_ignore_case() {
    let h = Harness::with_instance(Instance::new(VM, Status::Stopped));

    h.send(OWNER, &format!("/Status {}", VM)).await;
    h.send(OWNER, &format!("/STOP_VM {}", VM)).await;

    assert_eq!(h.texts(), vec!["Status: STOPPED", "VM is already stopped"]);
    assert_eq!(h.compute.get_calls(), 2);
}

#[tokio::test]
async fn test_start_lists_commands() {
    let h = Harness::new(None);

    h.send(OWNER, "/start").await;
    h.send(OWNER, "/reboot now").await;

    assert_eq!(
        h.texts(),
        vec![
            "Available commands: /status, /get_ip, /start_vm, /stop_vm",
            "Unknown command. Available commands: /status, /get_ip, /start_vm, /stop_vm",
        ]
    );
    assert_eq!(h.compute.remote_calls(), 0);
}

#[tokio::test]
async fn test_get_ip_without_interfaces() {
    let h = Harness::with_instance(running(None));

    h.send(OWNER, &format!("/get_ip {}", VM)).await;

    assert_eq!(h.texts(), vec!["No external IP"]);
}

#[tokio::test]
async fn test_get_ip_with_external_address() {
    let h = Harness::with_instance(running(Some("1.2.3.4")));

    h.send(OWNER, &format!("/get_ip {}", VM)).await;

    let sent = h.messenger.sent();
    assert_eq!(sent[0].text, "IP: 1.2.3.4");
    assert_eq!(sent[0].parse_mode, ParseMode::Plain);
    assert_eq!(sent[0].chat_id, OWNER);
}

#[tokio::test]
async fn test_get_ip_on_stopped_instance() {
    let h = Harness::with_instance(
        Instance::new(VM, Status::Stopped).with_interface(NetworkInterface::external("1.2.3.4")),
    );

    h.send(OWNER, &format!("/get_ip {}", VM)).await;

    assert_eq!(h.texts(), vec!["VM is not running"]);
}

#[tokio::test]
async fn test_status_is_idempotent() {
    let h = Harness::with_instance(Instance::new(VM, Status::Stopped));

    h.send(OWNER, &format!("/status {}", VM)).await;
    h.send(OWNER, &format!("/status {}", VM)).await;

    assert_eq!(h.texts(), vec!["Status: STOPPED", "Status: STOPPED"]);
    assert_eq!(h.compute.get_calls(), 2);
}

#[tokio::test]
async fn test_start_on_running_instance_is_rejected() {
    let h = Harness::with_instance(running(Some("1.2.3.4")));

    h.send(OWNER, &format!("/start_vm {}", VM)).await;

    assert_eq!(h.texts(), vec!["VM is already running"]);
    assert_eq!(h.compute.start_calls(), 0);
}

#[tokio::test]
async fn test_start_on_provisioning_instance_is_rejected() {
    let h = Harness::with_instance(Instance::new(VM, Status::Provisioning));

    h.send(OWNER, &format!("/start_vm {}", VM)).await;

    assert_eq!(h.texts(), vec!["VM is already starting"]);
    assert_eq!(h.compute.start_calls(), 0);
}

#[tokio::test]
async fn test_stop_guards() {
    let h = Harness::with_instance(Instance::new(VM, Status::Stopped));
    h.send(OWNER, &format!("/stop_vm {}", VM)).await;

    h.compute.insert(Instance::new(VM, Status::Stopping));
    h.send(OWNER, &format!("/stop_vm {}", VM)).await;

    assert_eq!(
        h.texts(),
        vec!["VM is already stopped", "VM is already stopping"]
    );
    assert_eq!(h.compute.stop_calls(), 0);
}

#[tokio::test]
async fn test_start_replies_before_tracker_resolves() {
    let h = Harness::new(Some(BROADCAST));
    h.compute.insert(Instance::new(VM, Status::Stopped));
    h.compute.set_started_instance(running(Some("5.6.7.8")));
    h.compute.gate();

    h.send(OWNER, &format!("/start_vm {}", VM)).await;

    // the operation is still pending
    let sent = h.messenger.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].chat_id, OWNER);
    assert_eq!(sent[0].text, "VM is starting...");
    assert_eq!(sent[1].chat_id, BROADCAST);
    assert_eq!(sent[1].text, format!("⚠️ `{}` was started", VM));
    assert_eq!(h.compute.start_calls(), 1);

    h.compute.release();
    let sent = h.messenger.wait_for(3).await;

    let done = &sent[2];
    assert_eq!(done.chat_id, OWNER);
    assert_eq!(done.parse_mode, ParseMode::MarkdownV2);
    assert!(done.text.contains(r"5\.6\.7\.8"));
    assert_eq!(
        done.text,
        format!(r"`{}` is now running \(IP: 5\.6\.7\.8\)", VM)
    );
    assert!(h.router.in_flight().is_empty());
}

#[tokio::test]
async fn test_stop_reports_completion() {
    let h = Harness::with_instance(running(Some("1.2.3.4")));

    h.send(OWNER, &format!("/stop_vm {}", VM)).await;
    let sent = h.messenger.wait_for(2).await;

    assert_eq!(sent[0].text, "VM is stopping...");
    assert_eq!(sent[1].text, format!("Stopped `{}`", VM));
    assert_eq!(h.compute.stop_calls(), 1);
}

#[tokio::test]
async fn test_duplicate_request_while_in_flight() {
    let h = Harness::with_instance(Instance::new(VM, Status::Stopped));
    h.compute.set_started_instance(running(None));
    h.compute.gate();

    h.send(OWNER, &format!("/start_vm {}", VM)).await;
    h.send(OWNER, &format!("/start_vm {}", VM)).await;

    let sent = h.messenger.sent();
    assert_eq!(sent[1].parse_mode, ParseMode::MarkdownV2);
    assert_eq!(
        sent[1].text,
        format!("An operation on `{}` is already in progress", VM)
    );
    assert_eq!(h.compute.start_calls(), 1);
    assert!(h.router.in_flight().contains(VM));

    h.compute.release();
    h.messenger.wait_for(3).await;
    assert!(h.router.in_flight().is_empty());
}

#[tokio::test]
async fn test_rejected_mutation_releases_instance() {
    let h = Harness::with_instance(Instance::new(VM, Status::Stopped));
    h.compute.fail_mutations();

    h.send(OWNER, &format!("/start_vm {}", VM)).await;

    assert_eq!(
        h.texts(),
        vec!["An error occurred, maybe the instance is already running"]
    );
    assert!(h.router.in_flight().is_empty());
    assert_eq!(h.compute.wait_calls(), 0);
}

#[tokio::test]
async fn test_rejected_stop_message() {
    let h = Harness::with_instance(running(None));
    h.compute.fail_mutations();

    h.send(OWNER, &format!("/stop_vm {}", VM)).await;

    assert_eq!(
        h.texts(),
        vec!["An error occurred, maybe the instance is already stopped"]
    );
}

#[tokio::test]
async fn test_unknown_instance_id() {
    let h = Harness::new(None);
    let events = LogEvents::errors();
    let _guard = events.install();

    h.send(OWNER, "/status missing").await;

    assert_eq!(h.texts(), vec!["Invalid instance id"]);
    assert_eq!(events.count(), 0);
}

#[tokio::test]
async fn test_unclassified_error_is_logged() {
    let h = Harness::new(None);
    h.compute
        .fail_gets(FakeFailure::Transport("connection refused".to_string()));
    let events = LogEvents::errors();
    let _guard = events.install();

    h.send(OWNER, &format!("/status {}", VM)).await;

    assert_eq!(h.texts(), vec!["An unknown error occurred"]);
    assert_eq!(events.count(), 1);
}

#[tokio::test]
async fn test_invalid_id_rpc_from_mutating_commands() {
    let h = Harness::new(Some(BROADCAST));
    h.compute.fail_gets(FakeFailure::Rpc {
        code: 3,
        details: "invalid instance id: xyz".to_string(),
    });

    h.send(OWNER, "/start_vm xyz").await;
    h.send(OWNER, "/stop_vm xyz").await;

    assert_eq!(
        h.texts(),
        vec!["Invalid instance id", "Invalid instance id"]
    );
    assert_eq!(h.compute.start_calls() + h.compute.stop_calls(), 0);
}
