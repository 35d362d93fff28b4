//! Strictly ordered execution of deferred asynchronous tasks.
//!
//! [`SerialTaskQueue`] accepts tasks that have not started yet, runs them one
//! at a time in submission order and hands every result to a single
//! registered callback before the next task is started. Callers never need to
//! know whether a drain is already in progress: [`SerialTaskQueue::add`] either
//! starts the drain loop or leaves the task for the loop that is running.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::time::timeout;

use crate::models::{CoreError, CoreErrorKind};
use crate::orchestration::OrchestrationResult;

pub type TaskFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A task that does nothing until the queue invokes it.
pub type DeferredTask<T> = Box<dyn FnOnce() -> TaskFuture<T> + Send>;

/// Receives the result of every task, in submission order.
///
/// A task that panics is delivered as `Err` with [`CoreErrorKind::Internal`].
pub type ResultCallback<T> = Arc<dyn Fn(OrchestrationResult<T>) + Send + Sync>;

/// Boxes an async closure into a [`DeferredTask`].
pub fn deferred<F, Fut, T>(task: F) -> DeferredTask<T>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    Box::new(move || Box::pin(task()) as TaskFuture<T>)
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueueSnapshot {
    pub pending: usize,
    pub busy: bool,
    pub drain_loops_started: u64,
    pub tasks_completed: u64,
}

/// FIFO queue with at most one active drain loop.
///
/// Cloning yields another handle to the same queue.
pub struct SerialTaskQueue<T> {
    inner: Arc<QueueInner<T>>,
}

impl<T> Clone for SerialTaskQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct QueueInner<T> {
    runtime: Handle,
    state: Mutex<QueueState<T>>,
    idle: Notify,
    drain_loops_started: AtomicU64,
    tasks_started: AtomicU64,
    tasks_completed: AtomicU64,
}

struct QueueState<T> {
    pending: VecDeque<DeferredTask<T>>,
    busy: bool,
    callback: Option<ResultCallback<T>>,
}

impl<T> QueueInner<T> {
    // No user code runs while the lock is held, so a poisoned lock still
    // guards consistent state.
    fn lock_state(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + 'static> Default for SerialTaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> SerialTaskQueue<T> {
    /// Creates a queue whose drain loops run on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime; use
    /// [`SerialTaskQueue::with_runtime`] to pass a handle explicitly.
    pub fn new() -> Self {
        Self::with_runtime(Handle::current())
    }

    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                runtime,
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    busy: false,
                    callback: None,
                }),
                idle: Notify::new(),
                drain_loops_started: AtomicU64::new(0),
                tasks_started: AtomicU64::new(0),
                tasks_completed: AtomicU64::new(0),
            }),
        }
    }

    /// Stores the result handler, replacing any handler registered before.
    ///
    /// The handler in place when a task finishes is the one that receives its
    /// result.
    pub fn register_callback<F>(&self, callback: F)
    where
        F: Fn(OrchestrationResult<T>) + Send + Sync + 'static,
    {
        let mut state = self.inner.lock_state();
        state.callback = Some(Arc::new(callback));
    }

    /// Appends `task` and returns without awaiting it.
    ///
    /// Starts a drain loop on the queue's runtime when none is active. Safe to
    /// call from threads that are not part of that runtime.
    pub fn add(&self, task: DeferredTask<T>) {
        let start_drain = {
            let mut state = self.inner.lock_state();
            state.pending.push_back(task);
            if state.busy {
                false
            } else {
                state.busy = true;
                true
            }
        };

        if start_drain {
            let drain_loop = self.inner.drain_loops_started.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::debug!(drain_loop, "starting drain loop");
            self.inner.runtime.spawn(drain(self.inner.clone()));
        }
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let (pending, busy) = {
            let state = self.inner.lock_state();
            (state.pending.len(), state.busy)
        };

        QueueSnapshot {
            pending,
            busy,
            drain_loops_started: self.inner.drain_loops_started.load(Ordering::SeqCst),
            tasks_completed: self.inner.tasks_completed.load(Ordering::SeqCst),
        }
    }

    pub fn is_idle(&self) -> bool {
        let state = self.inner.lock_state();
        !state.busy && state.pending.is_empty()
    }

    /// Resolves once every queued task has been delivered and no drain loop
    /// is active.
    pub async fn wait_for_idle(
        &self,
        timeout_duration: Option<Duration>,
    ) -> OrchestrationResult<()> {
        let wait = async {
            loop {
                // Registered before the check so a drain that ends in between
                // still wakes us.
                let notified = self.inner.idle.notified();
                if self.is_idle() {
                    return;
                }
                notified.await;
            }
        };

        match timeout_duration {
            Some(duration) => timeout(duration, wait).await.map_err(|_| {
                let snapshot = self.snapshot();
                CoreError::new(
                    CoreErrorKind::Timeout,
                    format!(
                        "timed out waiting for queue to drain ({} task(s) pending)",
                        snapshot.pending
                    ),
                )
            }),
            None => {
                wait.await;
                Ok(())
            }
        }
    }
}

async fn drain<T: Send + 'static>(inner: Arc<QueueInner<T>>) {
    loop {
        let task = {
            let mut state = inner.lock_state();
            match state.pending.pop_front() {
                Some(task) => task,
                None => {
                    state.busy = false;
                    break;
                }
            }
        };

        let task_seq = inner.tasks_started.fetch_add(1, Ordering::SeqCst);
        let result = run_contained(&inner.runtime, task).await;
        if let Err(error) = &result {
            tracing::error!(
                task_seq,
                kind = ?error.kind,
                message = %error.message,
                "queued task did not produce a result"
            );
        }

        let callback = inner.lock_state().callback.clone();
        if let Some(callback) = callback
            && catch_unwind(AssertUnwindSafe(|| callback(result))).is_err()
        {
            tracing::error!(task_seq, "result callback panicked");
        }

        inner.tasks_completed.fetch_add(1, Ordering::SeqCst);
    }

    inner.idle.notify_waiters();
}

// Runs the task on its own Tokio task so a panic surfaces as a JoinError
// instead of unwinding through the drain loop.
async fn run_contained<T: Send + 'static>(
    runtime: &Handle,
    task: DeferredTask<T>,
) -> OrchestrationResult<T> {
    runtime
        .spawn(async move { task().await })
        .await
        .map_err(|join_error| {
            CoreError::new(
                CoreErrorKind::Internal,
                format!("queued task failed: {join_error}"),
            )
        })
}
