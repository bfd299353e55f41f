//! In-memory test doubles
//!
//! Enabled for unit tests and, through the `test-utils` feature, for the
//! integration tests of this and downstream crates.

use crate::error::{BotError, Result};
use crate::messenger::{Messenger, OutgoingMessage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Semaphore, watch};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use vmbot_cloud::{CloudError, Instance, InstanceClient, Operation};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Error returned by [`FakeCompute::get_instance`] once configured
#[derive(Debug, Clone)]
pub enum FakeFailure {
    Rpc { code: i32, details: String },
    Transport(String),
}

impl FakeFailure {
    fn to_error(&self) -> CloudError {
        match self {
            FakeFailure::Rpc { code, details } => CloudError::rpc(*code, details.clone()),
            FakeFailure::Transport(reason) => CloudError::Transport(reason.clone()),
        }
    }
}

/// Scriptable [`InstanceClient`] that counts every remote call
pub struct FakeCompute {
    instances: Mutex<HashMap<String, Instance>>,
    started: Mutex<Option<Instance>>,
    get_failure: Mutex<Option<FakeFailure>>,
    fail_mutations: AtomicBool,
    fail_waits: AtomicBool,
    gated: AtomicBool,
    gate: Semaphore,
    get_calls: AtomicUsize,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    wait_calls: AtomicUsize,
}

impl Default for FakeCompute {
    fn default() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
            started: Mutex::new(None),
            get_failure: Mutex::new(None),
            fail_mutations: AtomicBool::new(false),
            fail_waits: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            get_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            wait_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeCompute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(instance: Instance) -> Self {
        let compute = Self::new();
        compute.insert(instance);
        compute
    }

    pub fn insert(&self, instance: Instance) {
        lock(&self.instances).insert(instance.id.clone(), instance);
    }

    /// Snapshot returned by `wait_started`
    ///
    /// It replaces the stored instance once the wait completes.
    pub fn set_started_instance(&self, instance: Instance) {
        *lock(&self.started) = Some(instance);
    }

    pub fn fail_gets(&self, failure: FakeFailure) {
        *lock(&self.get_failure) = Some(failure);
    }

    pub fn fail_mutations(&self) {
        self.fail_mutations.store(true, Ordering::SeqCst);
    }

    pub fn fail_waits(&self) {
        self.fail_waits.store(true, Ordering::SeqCst);
    }

    /// Make every wait block until [`FakeCompute::release`]
    pub fn gate(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    /// Let one blocked (or future) wait through
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn wait_calls(&self) -> usize {
        self.wait_calls.load(Ordering::SeqCst)
    }

    pub fn remote_calls(&self) -> usize {
        self.get_calls() + self.start_calls() + self.stop_calls() + self.wait_calls()
    }

    async fn pass_gate(&self) -> vmbot_cloud::Result<()> {
        self.wait_calls.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| CloudError::Transport(e.to_string()))?;
            permit.forget();
        }
        if self.fail_waits.load(Ordering::SeqCst) {
            return Err(CloudError::Transport("connection reset".to_string()));
        }
        Ok(())
    }

    fn mutate(&self, instance: &Instance, verb: &str) -> vmbot_cloud::Result<Operation> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(CloudError::rpc(9, "Instance is in an invalid state"));
        }
        Ok(Operation::pending(
            format!("op-{}-{}", verb, instance.id),
            format!("{} instance", verb),
        ))
    }
}

#[async_trait]
impl InstanceClient for FakeCompute {
    fn name(&self) -> &str {
        "fake"
    }

    async fn get_instance(&self, id: &str) -> vmbot_cloud::Result<Instance> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = lock(&self.get_failure).as_ref() {
            return Err(failure.to_error());
        }
        lock(&self.instances)
            .get(id)
            .cloned()
            .ok_or_else(|| CloudError::rpc(5, format!("The instance {} was not found", id)))
    }

    async fn start_instance(&self, instance: &Instance) -> vmbot_cloud::Result<Operation> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.mutate(instance, "start")
    }

    async fn stop_instance(&self, instance: &Instance) -> vmbot_cloud::Result<Operation> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.mutate(instance, "stop")
    }

    async fn wait_started(&self, operation: Operation) -> vmbot_cloud::Result<Instance> {
        self.pass_gate().await?;
        let instance = lock(&self.started).clone().ok_or_else(|| {
            CloudError::UnexpectedResponse(format!("no instance for operation {}", operation.id))
        })?;
        self.insert(instance.clone());
        Ok(instance)
    }

    async fn wait_stopped(&self, _operation: Operation) -> vmbot_cloud::Result<()> {
        self.pass_gate().await
    }
}

/// [`Messenger`] that records every delivered message
pub struct RecordingMessenger {
    sent: Mutex<Vec<OutgoingMessage>>,
    attempts: AtomicUsize,
    failing: bool,
    delivered: watch::Sender<usize>,
}

impl Default for RecordingMessenger {
    fn default() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            failing: false,
            delivered: watch::Sender::new(0),
        }
    }
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messenger whose every send fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        lock(&self.sent).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        lock(&self.sent).iter().map(|m| m.text.clone()).collect()
    }

    /// Number of send calls, failed ones included
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` messages were delivered
    ///
    /// # Panics
    ///
    /// Panics after a few seconds without enough messages.
    pub async fn wait_for(&self, count: usize) -> Vec<OutgoingMessage> {
        let mut rx = self.delivered.subscribe();
        let reached = matches!(
            tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(|n| *n >= count)).await,
            Ok(Ok(_))
        );
        if !reached {
            panic!("expected {} messages, got {:?}", count, self.texts());
        }
        self.sent()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(BotError::SendFailed {
                chat_id: message.chat_id,
                reason: "chat not found".to_string(),
            });
        }
        let count = {
            let mut sent = lock(&self.sent);
            sent.push(message);
            sent.len()
        };
        self.delivered.send_replace(count);
        Ok(())
    }
}

/// Counts tracing events of one level emitted under its subscriber
#[derive(Debug, Clone)]
pub struct LogEvents {
    level: Level,
    count: Arc<AtomicUsize>,
}

struct CountLevel {
    level: Level,
    count: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for CountLevel {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == self.level {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl LogEvents {
    pub fn at(level: Level) -> Self {
        Self {
            level,
            count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn errors() -> Self {
        Self::at(Level::ERROR)
    }

    pub fn warnings() -> Self {
        Self::at(Level::WARN)
    }

    fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        tracing_subscriber::registry().with(CountLevel {
            level: self.level,
            count: Arc::clone(&self.count),
        })
    }

    /// Run `f` with the counting subscriber as the thread default
    pub fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::subscriber::with_default(self.subscriber(), f)
    }

    /// Install the counting subscriber for the current thread
    ///
    /// Async tests on the current-thread runtime also see events from the
    /// tasks they spawn.
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(self.subscriber())
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}
