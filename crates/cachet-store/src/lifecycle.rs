use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{StoreError, StoreResult};

/// Lifecycle of a store's background machinery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LifecycleState {
    #[default]
    Running = 0,
    Draining = 1,
    Closed = 2,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Closed => "closed",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Closed,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stop signal handed to every supervised task.
///
/// Resolves once shutdown is requested or the owning [`TaskGroup`] is dropped.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub(crate) fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&mut self) {
        // An error means the sender is gone, which is also a stop.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Records the first background task that died.
#[derive(Debug, Default)]
pub struct Health {
    failed_task: OnceLock<String>,
}

impl Health {
    pub fn mark_failed(&self, task: &str) {
        let _ = self.failed_task.set(task.to_string());
    }

    pub fn failed_task(&self) -> Option<&str> {
        self.failed_task.get().map(String::as_str)
    }

    pub fn is_healthy(&self) -> bool {
        self.failed_task.get().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskExit {
    Finished,
    Panicked,
    Cancelled,
}

/// A set of named background tasks sharing one stop signal.
///
/// Each task is watched by a small monitor task, so a panic is noticed (and
/// recorded in [`Health`]) when it happens rather than when the group is
/// joined. Dropping the group without calling [`shutdown`](Self::shutdown)
/// still stops the tasks: their signals resolve when the sender goes away.
pub struct TaskGroup {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<TaskExit>)>,
    health: Arc<Health>,
}

impl TaskGroup {
    pub fn new(health: Arc<Health>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            tasks: Vec::new(),
            health,
        }
    }

    /// Spawn a supervised task. `task` receives the group's stop signal.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, task: F)
    where
        F: FnOnce(ShutdownSignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let signal = ShutdownSignal::new(self.shutdown.subscribe());
        let inner = tokio::spawn(task(signal));
        let health = Arc::clone(&self.health);

        let monitor = tokio::spawn(async move {
            match inner.await {
                Ok(()) => TaskExit::Finished,
                Err(e) if e.is_panic() => {
                    health.mark_failed(name);
                    error!(task = name, "background task panicked; store is unhealthy");
                    TaskExit::Panicked
                }
                Err(_) => TaskExit::Cancelled,
            }
        });
        self.tasks.push((name, monitor));
        debug!(task = name, "background task started");
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Broadcast the stop signal and wait for every task to finish.
    ///
    /// Returns [`StoreError::TaskFailed`] naming the first task that panicked,
    /// but only after all tasks have been joined.
    pub async fn shutdown(self) -> StoreResult<()> {
        // Fails only when every task already exited and dropped its receiver.
        let _ = self.shutdown.send(true);

        let mut failed: Option<&'static str> = None;
        for (name, handle) in self.tasks {
            match handle.await {
                Ok(TaskExit::Finished) => debug!(task = name, "background task stopped"),
                Ok(TaskExit::Panicked) => {
                    failed.get_or_insert(name);
                }
                Ok(TaskExit::Cancelled) | Err(_) => {
                    warn!(task = name, "background task was cancelled before stopping")
                }
            }
        }

        match failed {
            Some(name) => Err(StoreError::TaskFailed(name.to_string())),
            None => Ok(()),
        }
    }
}

/// Lifecycle controller: `Running -> Draining -> Closed`.
///
/// Owns the [`TaskGroup`] and is the only place that knows how many
/// background tasks exist. The drain runs on its own task, so a caller that
/// stops waiting on [`close`](Self::close) does not strand the store in
/// `Draining`.
pub struct Lifecycle {
    state: Arc<AtomicU8>,
    health: Arc<Health>,
    tasks: Mutex<Option<TaskGroup>>,
    outcome: Arc<watch::Sender<Option<StoreResult<()>>>>,
}

impl Lifecycle {
    pub fn new(tasks: TaskGroup) -> Self {
        let health = Arc::clone(&tasks.health);
        let (outcome, _) = watch::channel(None);
        Self {
            state: Arc::new(AtomicU8::new(LifecycleState::Running as u8)),
            health,
            tasks: Mutex::new(Some(tasks)),
            outcome: Arc::new(outcome),
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    /// Fail fast if the store is closed or a background task has died.
    pub fn ensure_serving(&self) -> StoreResult<()> {
        if self.state() == LifecycleState::Closed {
            return Err(StoreError::Closed);
        }
        if let Some(task) = self.health.failed_task() {
            return Err(StoreError::Unhealthy(task.to_string()));
        }
        Ok(())
    }

    /// Stop all background tasks and wait for them.
    ///
    /// The first call starts the drain and reports its outcome. A concurrent
    /// or repeated call waits for the drain to finish and then returns
    /// `Ok(())`. Dropping the returned future does not stop the drain.
    pub async fn close(&self) -> StoreResult<()> {
        let mut done = self.outcome.subscribe();
        let group = self.tasks.lock().expect("lock poisoned").take();
        let started = group.is_some();

        if let Some(group) = group {
            self.state
                .store(LifecycleState::Draining as u8, Ordering::Release);
            info!(tasks = group.len(), "draining background tasks");

            let state = Arc::clone(&self.state);
            let outcome = Arc::clone(&self.outcome);
            tokio::spawn(async move {
                let result = group.shutdown().await;
                state.store(LifecycleState::Closed as u8, Ordering::Release);
                info!("store closed");
                outcome.send_replace(Some(result));
            });
        }

        let result = match done.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone().unwrap_or(Ok(())),
            // The sender lives in `self`; unreachable while borrowed.
            Err(_) => Ok(()),
        };
        if started {
            result
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .field("health", &self.health)
            .finish()
    }
}
