//! In-memory FIFO of check tasks with per-url dedup.

use std::collections::{HashSet, VecDeque};
use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::domain::{RepoUrl, Task};

/// Queue state. `ready` and `in_flight` are only ever touched together under
/// one lock, so "is present" and "insert" are never two separate steps.
#[derive(Default)]
struct QueueState {
    /// Tasks waiting for a runner, FIFO.
    ready: VecDeque<Task>,

    /// Url keys of every task that is queued or being checked.
    in_flight: HashSet<String>,

    /// Set by `close()`; no new tasks are accepted afterwards.
    closed: bool,
}

/// Observability snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub queued: usize,
    pub running: usize,
    pub urls: Vec<String>,
}

/// Blocking, capacity-unbounded FIFO with an in-flight set keyed by url.
///
/// A url enters the in-flight set when `put` accepts its task and leaves it
/// when `done` is called for that task. At most one task per url is in the
/// set at any time.
pub struct TaskQueue {
    state: Mutex<QueueState>,
    /// Signalled once per accepted task.
    available: Notify,
    /// Signalled when the in-flight set becomes empty.
    idle: Notify,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            available: Notify::new(),
            idle: Notify::new(),
        }
    }

    // no code path panics while holding the lock, recover the guard anyway
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue `task` unless a task for the same url is queued or running.
    ///
    /// Returns `false` without side effects for duplicates and after
    /// `close()`.
    pub fn put(&self, task: Task) -> bool {
        {
            let mut state = self.lock();
            if state.closed {
                warn!(url = %task.url(), "cannot add task to a closed queue");
                return false;
            }
            if !state.in_flight.insert(task.url().key().to_string()) {
                debug!(url = %task.url(), "task already in flight");
                return false;
            }
            state.ready.push_back(task);
            debug!(size = state.in_flight.len(), "task added to queue");
        }
        self.available.notify_one();
        true
    }

    /// Dequeue the oldest task, waiting at most `timeout`.
    ///
    /// `None` means the wait timed out. The returned task stays in flight
    /// until `done` is called for it.
    pub async fn get(&self, timeout: Duration) -> Option<Task> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // enabled before checking `ready`: a put after the check wakes this
            // waiter instead of only leaving a single shared permit
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(task) = self.lock().ready.pop_front() {
                return Some(task);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }

    /// Mark a dequeued task as finished and release its url.
    ///
    /// Must be called exactly once per task returned by `get`.
    pub fn done(&self, task: &Task) {
        let now_idle = {
            let mut state = self.lock();
            if !state.in_flight.remove(task.url().key()) {
                warn!(url = %task.url(), "done called for a url that is not in flight");
            }
            state.in_flight.is_empty()
        };
        if now_idle {
            self.idle.notify_waiters();
        }
    }

    pub fn contains(&self, url: &RepoUrl) -> bool {
        self.lock().in_flight.contains(url.key())
    }

    /// Number of tasks queued or being checked.
    pub fn len(&self) -> usize {
        self.lock().in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until every accepted task has been marked done.
    pub async fn drain(&self) {
        loop {
            let idle = self.idle.notified();
            if self.lock().in_flight.is_empty() {
                return;
            }
            idle.await;
        }
    }

    /// Stop accepting tasks. Already accepted tasks are unaffected.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Drop every task that has not been handed to a runner yet.
    ///
    /// Returns how many were dropped.
    pub fn discard_queued(&self) -> usize {
        let (discarded, now_idle) = {
            let mut state = self.lock();
            let ready = std::mem::take(&mut state.ready);
            for task in &ready {
                state.in_flight.remove(task.url().key());
            }
            (ready.len(), state.in_flight.is_empty())
        };
        if now_idle {
            self.idle.notify_waiters();
        }
        discarded
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.lock();
        let mut urls: Vec<String> = state.in_flight.iter().cloned().collect();
        urls.sort();
        QueueSnapshot {
            queued: state.ready.len(),
            running: state.in_flight.len() - state.ready.len(),
            urls,
        }
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// A dequeued task that releases its url when dropped.
///
/// Runners hold one of these for the whole check so `done` happens on every
/// exit path, including a panic inside the checker.
pub struct InFlight<'a> {
    queue: &'a TaskQueue,
    task: Task,
}

impl<'a> InFlight<'a> {
    pub fn new(queue: &'a TaskQueue, task: Task) -> Self {
        Self { queue, task }
    }
}

impl Deref for InFlight<'_> {
    type Target = Task;

    fn deref(&self) -> &Task {
        &self.task
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.queue.done(&self.task);
    }
}
