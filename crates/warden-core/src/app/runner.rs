//! Runners: long-lived workers that take tasks off the queue, run the remote
//! check and write the result back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::status::RunStats;
use crate::domain::{CheckError, Status, Task};
use crate::ports::{Clock, RemoteChecker, RepositoryStore};
use crate::queue::{InFlight, TaskQueue};

/// Everything a runner needs, shared by the whole pool.
pub(crate) struct RunnerContext {
    pub(crate) queue: Arc<TaskQueue>,
    pub(crate) store: Arc<dyn RepositoryStore>,
    pub(crate) checker: Arc<dyn RemoteChecker>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) stats: RunStats,
    pub(crate) poll_timeout: Duration,
    pub(crate) check_timeout: Duration,
}

/// How one task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Result written to the store.
    Applied(Status),

    /// Check exceeded the hard timeout and was abandoned.
    TimedOut,

    /// The SSH channel failed, not the linter.
    TransportFailure,

    /// The check produced output outside the result schema.
    MalformedResult,

    /// The checker could not be started at all.
    CheckerUnavailable,

    /// The checker panicked.
    CheckerPanicked,

    /// The check succeeded but the store rejected the update.
    StoreFailed,
}

impl RunOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, RunOutcome::Applied(_))
    }
}

/// Runner pool handle.
/// - `request_shutdown()` で全 runner に停止を通知
/// - `shutdown_and_join()` で全 runner の終了を待てる
pub(crate) struct RunnerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl RunnerGroup {
    /// Spawn `n` runners on the current tokio runtime.
    pub(crate) fn spawn(n: usize, ctx: Arc<RunnerContext>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let joins = (0..n)
            .map(|runner_id| {
                let ctx = Arc::clone(&ctx);
                let rx = shutdown_rx.clone();
                tokio::spawn(runner_loop(runner_id, ctx, rx))
            })
            .collect();

        Self { shutdown_tx, joins }
    }

    pub(crate) fn len(&self) -> usize {
        self.joins.len()
    }

    /// Ask every runner to stop. A check that is already running is not
    /// interrupted; its runner exits after finishing it.
    pub(crate) fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub(crate) async fn shutdown_and_join(self) {
        self.request_shutdown();
        for (runner_id, join) in self.joins.into_iter().enumerate() {
            if let Err(err) = join.await {
                error!(runner_id, error = %err, "runner terminated abnormally");
            }
        }
    }
}

async fn runner_loop(
    runner_id: usize,
    ctx: Arc<RunnerContext>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    debug!(runner_id, "runner started");
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let task = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    // group handle dropped without a shutdown
                    break;
                }
                continue;
            }
            task = ctx.queue.get(ctx.poll_timeout) => task,
        };

        let Some(task) = task else {
            continue;
        };

        // released on drop, whatever happens below
        let task = InFlight::new(&ctx.queue, task);
        let outcome = process(&ctx, &task).await;
        ctx.stats.record(&outcome);
    }
    debug!(runner_id, "runner stopped");
}

/// Run one check and apply its result. Never fails: every error is logged
/// and reported as a non-applied outcome, leaving the record untouched.
pub(crate) async fn process(ctx: &RunnerContext, task: &Task) -> RunOutcome {
    debug!(url = %task.url(), remote = %task.remote(), "linting");
    let started = Instant::now();

    // Own task so a panicking checker cannot take the runner down, and so
    // aborting it on timeout drops (and kills) the remote process.
    let checker = Arc::clone(&ctx.checker);
    let (protocol, url) = (task.protocol(), task.url().clone());
    let handle = tokio::spawn(async move { checker.check(protocol, &url).await });
    let abort = handle.abort_handle();

    let result = match tokio::time::timeout(ctx.check_timeout, handle).await {
        Err(_) => {
            abort.abort();
            Err(CheckError::Timeout)
        }
        Ok(Err(join_err)) => {
            error!(url = %task.url(), error = %join_err, "checker panicked");
            return RunOutcome::CheckerPanicked;
        }
        Ok(Ok(result)) => result,
    };

    let report = match result {
        Ok(report) => report,
        Err(CheckError::Timeout) => {
            warn!(
                url = %task.url(),
                timeout_secs = ctx.check_timeout.as_secs(),
                "linting timed out"
            );
            return RunOutcome::TimedOut;
        }
        Err(CheckError::TransportFailure { stderr }) => {
            warn!(
                url = %task.url(),
                stderr = %stderr.trim(),
                "transport to check worker failed, record left unchanged"
            );
            return RunOutcome::TransportFailure;
        }
        Err(CheckError::MalformedResult(reason)) => {
            error!(url = %task.url(), %reason, "check returned a malformed result");
            return RunOutcome::MalformedResult;
        }
        Err(CheckError::Io(err)) => {
            error!(url = %task.url(), error = %err, "could not run the checker");
            return RunOutcome::CheckerUnavailable;
        }
    };

    debug!(
        url = %task.url(),
        exit_code = report.exit_code,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "finished linting"
    );

    let update = task.apply_result(&report, ctx.clock.now());
    let status = update.status;
    match ctx.store.update(task.url(), update).await {
        Ok(()) => {
            info!(
                url = %task.url(),
                hash = %task.target_hash(),
                %status,
                "repository checked"
            );
            RunOutcome::Applied(status)
        }
        Err(err) => {
            error!(url = %task.url(), error = %err, "could not store check result");
            RunOutcome::StoreFailed
        }
    }
}
