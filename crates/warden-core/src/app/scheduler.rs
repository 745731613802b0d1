//! Scheduler - decides whether a repository needs a check and owns the
//! runner pool that performs it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::resolver::RepoKeyResolver;
use super::runner::{RunnerContext, RunnerGroup};
use super::status::QueueCounts;
use crate::config::SchedulerConfig;
use crate::domain::{
    Decision, DecisionInput, EnqueueReason, RepoUrl, RepositoryRecord, ScheduleError, Status,
    Task, decide,
};

/// Entry point for request handlers.
///
/// `schedule` may be called concurrently from any number of tasks. The only
/// shared mutable state is inside the [`TaskQueue`](crate::queue::TaskQueue),
/// which keeps at most one check per repository in flight.
pub struct Scheduler {
    ctx: Arc<RunnerContext>,
    resolver: RepoKeyResolver,
    config: SchedulerConfig,
    runners: Mutex<Option<RunnerGroup>>,
}

impl Scheduler {
    pub(crate) fn from_parts(
        ctx: RunnerContext,
        resolver: RepoKeyResolver,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            ctx: Arc::new(ctx),
            resolver,
            config,
            runners: Mutex::new(None),
        }
    }

    fn runners(&self) -> MutexGuard<'_, Option<RunnerGroup>> {
        self.runners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Schedule a check of `url` if it is new, outdated, or `force` is set.
    ///
    /// Returns the record as it stood when the decision was made. The check
    /// itself runs later; its result only shows up in the store.
    ///
    /// # Errors
    /// - `InvalidRepository` when `url` is malformed or no protocol reaches
    ///   it. Nothing is enqueued.
    /// - `Unregistered` when registration is required and missing.
    /// - `Store` when the store fails.
    pub async fn schedule(
        &self,
        url: &str,
        force: bool,
    ) -> Result<RepositoryRecord, ScheduleError> {
        let url = RepoUrl::parse(url).map_err(|err| {
            debug!(url, error = %err, "rejecting malformed repository url");
            ScheduleError::InvalidRepository(url.to_string())
        })?;
        let (protocol, latest) = self.resolver.resolve_protocol(&url).await?;

        let store = &self.ctx.store;
        if self.config.require_registration && !store.is_registered(&url).await? {
            return Err(ScheduleError::Unregistered(url));
        }

        let Some(record) = store.find_by_url(&url).await? else {
            debug!(%url, "creating new repository record");
            let record = store.create(&url).await?;
            self.enqueue(Task::new(protocol, url, latest), EnqueueReason::NewRepository);
            return Ok(record);
        };

        let decision = decide(DecisionInput {
            record: &record,
            latest: &latest,
            force,
            in_flight: self.ctx.queue.contains(&url),
            force_cooldown: self.config.force_cooldown(),
            now: self.ctx.clock.now(),
        });
        match decision {
            Decision::Enqueue(reason) => {
                self.enqueue(Task::new(protocol, url, latest), reason);
            }
            Decision::Skip(reason) => {
                debug!(%url, ?reason, "not scheduling a check");
            }
        }
        Ok(record)
    }

    fn enqueue(&self, task: Task, reason: EnqueueReason) -> bool {
        let url = task.url().clone();
        let hash = task.target_hash().clone();
        let accepted = self.ctx.queue.put(task);
        if accepted {
            info!(%url, %hash, ?reason, pending = self.ctx.queue.len(), "check scheduled");
        }
        accepted
    }

    /// Current status without contacting any remote. Absent records are
    /// `Unregistered`.
    pub async fn status(&self, url: &str) -> Result<Status, ScheduleError> {
        let url = RepoUrl::parse(url)
            .map_err(|_| ScheduleError::InvalidRepository(url.to_string()))?;
        let record = self.ctx.store.find_by_url(&url).await?;
        Ok(record.map_or(Status::Unregistered, |r| r.status))
    }

    /// Is a check for `url` queued or running?
    pub fn is_in_flight(&self, url: &RepoUrl) -> bool {
        self.ctx.queue.contains(url)
    }

    pub fn counts(&self) -> QueueCounts {
        let snapshot = self.ctx.queue.snapshot();
        QueueCounts {
            queued: snapshot.queued,
            running: snapshot.running,
            checked: self.ctx.stats.checked(),
            failed: self.ctx.stats.failed(),
        }
    }

    /// Start the runner pool on the current tokio runtime.
    pub fn run(&self) {
        let mut runners = self.runners();
        if runners.is_some() {
            warn!("scheduler is already running");
            return;
        }
        if self.ctx.queue.is_closed() {
            warn!("scheduler was joined and cannot be restarted");
            return;
        }
        info!(concurrency = self.config.concurrency, "starting runners");
        *runners = Some(RunnerGroup::spawn(
            self.config.concurrency,
            Arc::clone(&self.ctx),
        ));
    }

    pub fn is_running(&self) -> bool {
        self.runners().is_some()
    }

    /// Stop accepting checks, wait for every accepted check to finish, then
    /// stop the runners.
    ///
    /// Waits for at most the check timeout per in-flight check; idle runners
    /// stop immediately. If `run` was never called, queued checks are
    /// discarded instead of waited for.
    pub async fn join(&self) {
        self.ctx.queue.close();
        let runners = self.runners().take();
        let Some(runners) = runners else {
            let discarded = self.ctx.queue.discard_queued();
            if discarded > 0 {
                warn!(discarded, "scheduler was never started, discarding queued checks");
            }
            return;
        };

        debug!(pending = self.ctx.queue.len(), "finishing the queue");
        self.ctx.queue.drain().await;
        debug!(runners = runners.len(), "stopping all runners");
        runners.shutdown_and_join().await;
        debug!("finished stopping all runners");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::app::SchedulerBuilder;
    use crate::domain::{CommitHash, Protocol};
    use crate::impls::InMemoryRepositoryStore;
    use crate::testing::{FakeCheck, FakeChecker, FakeResolver};

    const URL: &str = "git.fsfe.org/reuse/api";

    fn url() -> RepoUrl {
        RepoUrl::parse(URL).unwrap()
    }

    struct Harness {
        scheduler: Arc<Scheduler>,
        store: Arc<InMemoryRepositoryStore>,
        resolver: Arc<FakeResolver>,
        checker: Arc<FakeChecker>,
    }

    fn harness_with(checker: FakeChecker, config: SchedulerConfig) -> Harness {
        let store = Arc::new(InMemoryRepositoryStore::new());
        let resolver = Arc::new(FakeResolver::new());
        resolver.set(&url(), Protocol::Https, "def");
        let checker = Arc::new(checker);
        let scheduler = SchedulerBuilder::new()
            .store(store.clone())
            .resolver(resolver.clone())
            .checker(checker.clone())
            .config(config)
            .build()
            .unwrap();
        Harness {
            scheduler: Arc::new(scheduler),
            store,
            resolver,
            checker,
        }
    }

    fn test_config() -> SchedulerConfig {
        SchedulerConfig {
            concurrency: 2,
            poll_timeout_secs: 1,
            check_timeout_secs: 5,
            resolve_timeout_secs: 1,
            ..SchedulerConfig::default()
        }
    }

    fn harness() -> Harness {
        harness_with(FakeChecker::new(FakeCheck::Exit(0)), test_config())
    }

    fn seed(store: &InMemoryRepositoryStore, hash: &str) -> RepositoryRecord {
        let mut record = RepositoryRecord::new(url());
        record.hash = Some(CommitHash::new(hash));
        record.status = Status::NonCompliant;
        record.lint_code = Some(1);
        record.lint_output = Some("previous lint".to_string());
        record.last_access = Some(Utc::now() - chrono::Duration::hours(1));
        store.insert(record.clone());
        record
    }

    #[tokio::test]
    async fn new_repository_gets_a_bare_record_and_one_task() {
        let h = harness();

        let record = h.scheduler.schedule(URL, false).await.unwrap();

        assert_eq!(record.status, Status::Uninitialised);
        assert!(record.hash.is_none());
        assert_eq!(h.store.get(&url()).unwrap(), record);
        assert_eq!(h.scheduler.ctx.queue.len(), 1);
        let task = h.scheduler.ctx.queue.get(Duration::from_millis(10)).await.unwrap();
        assert_eq!(task.target_hash(), &CommitHash::new("def"));
        assert_eq!(task.protocol(), Protocol::Https);
    }

    #[tokio::test]
    async fn repeated_schedule_enqueues_once() {
        let h = harness();

        h.scheduler.schedule(URL, false).await.unwrap();
        h.scheduler.schedule(URL, false).await.unwrap();

        assert_eq!(h.scheduler.ctx.queue.len(), 1);
    }

    #[tokio::test]
    async fn stale_hash_triggers_one_task_with_latest_hash() {
        let h = harness();
        let before = seed(&h.store, "abc");

        let record = h.scheduler.schedule(URL, false).await.unwrap();

        assert_eq!(record, before);
        assert_eq!(h.scheduler.ctx.queue.len(), 1);
        let task = h.scheduler.ctx.queue.get(Duration::from_millis(10)).await.unwrap();
        assert_eq!(task.target_hash(), &CommitHash::new("def"));
    }

    #[tokio::test]
    async fn up_to_date_record_is_only_rechecked_when_forced() {
        let h = harness();
        seed(&h.store, "def");

        h.scheduler.schedule(URL, false).await.unwrap();
        assert!(h.scheduler.ctx.queue.is_empty());

        h.scheduler.schedule(URL, true).await.unwrap();
        assert_eq!(h.scheduler.ctx.queue.len(), 1);
    }

    #[tokio::test]
    async fn force_does_not_override_in_flight_dedup() {
        let h = harness();
        seed(&h.store, "abc");

        h.scheduler.schedule(URL, true).await.unwrap();
        h.scheduler.schedule(URL, true).await.unwrap();
        h.scheduler.schedule(URL, false).await.unwrap();

        assert_eq!(h.scheduler.ctx.queue.len(), 1);
    }

    #[tokio::test]
    async fn force_cooldown_throttles_recent_checks() {
        let config = SchedulerConfig {
            force_cooldown_secs: 15,
            ..test_config()
        };
        let h = harness_with(FakeChecker::new(FakeCheck::Exit(0)), config);
        let mut record = seed(&h.store, "def");
        record.last_access = Some(Utc::now());
        h.store.insert(record);

        h.scheduler.schedule(URL, true).await.unwrap();
        assert!(h.scheduler.ctx.queue.is_empty());
    }

    #[tokio::test]
    async fn unreachable_url_is_invalid_and_enqueues_nothing() {
        let h = harness();

        let err = h
            .scheduler
            .schedule("example.org/does/not-exist", false)
            .await
            .unwrap_err();

        assert!(matches!(err, ScheduleError::InvalidRepository(_)));
        assert!(h.scheduler.ctx.queue.is_empty());
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn malformed_url_is_invalid_without_network() {
        let h = harness();

        let err = h.scheduler.schedule("not-a-url", false).await.unwrap_err();

        assert!(matches!(err, ScheduleError::InvalidRepository(u) if u == "not-a-url"));
        assert!(h.scheduler.ctx.queue.is_empty());
        assert!(h.resolver.calls().is_empty());
    }

    #[tokio::test]
    async fn unregistered_repository_is_refused_when_registration_is_required() {
        let config = SchedulerConfig {
            require_registration: true,
            ..test_config()
        };
        let h = harness_with(FakeChecker::new(FakeCheck::Exit(0)), config);

        let err = h.scheduler.schedule(URL, false).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Unregistered(_)));
        assert!(h.scheduler.ctx.queue.is_empty());

        h.store.register(&url());
        h.scheduler.schedule(URL, false).await.unwrap();
        assert_eq!(h.scheduler.ctx.queue.len(), 1);
    }

    #[tokio::test]
    async fn status_reports_unregistered_for_unknown_urls() {
        let h = harness();
        assert_eq!(h.scheduler.status(URL).await.unwrap(), Status::Unregistered);

        h.scheduler.schedule(URL, false).await.unwrap();
        assert_eq!(h.scheduler.status(URL).await.unwrap(), Status::Uninitialised);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_schedules_keep_one_task_in_flight() {
        let h = harness();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let scheduler = Arc::clone(&h.scheduler);
                tokio::spawn(async move { scheduler.schedule(URL, false).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(h.scheduler.ctx.queue.len(), 1);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn completed_check_updates_the_record() {
        let h = harness();
        let started = Utc::now();
        h.scheduler.run();

        h.scheduler.schedule(URL, false).await.unwrap();
        h.scheduler.join().await;

        let record = h.store.get(&url()).unwrap();
        assert_eq!(record.status, Status::Compliant);
        assert_eq!(record.hash, Some(CommitHash::new("def")));
        assert!(record.last_access.unwrap() >= started);
        assert_eq!(h.scheduler.counts().checked, 1);
    }

    #[tokio::test]
    async fn transport_failure_leaves_record_byte_for_byte() {
        let h = harness_with(FakeChecker::new(FakeCheck::TransportFailure), test_config());
        let before = seed(&h.store, "abc");
        h.scheduler.run();

        h.scheduler.schedule(URL, false).await.unwrap();
        h.scheduler.join().await;

        assert_eq!(h.store.get(&url()).unwrap(), before);
        assert_eq!(h.scheduler.counts().failed, 1);
    }

    #[tokio::test]
    async fn timed_out_check_releases_the_url() {
        let config = SchedulerConfig {
            check_timeout_secs: 1,
            ..test_config()
        };
        let h = harness_with(FakeChecker::new(FakeCheck::Hang), config);
        let before = seed(&h.store, "abc");
        h.scheduler.run();

        h.scheduler.schedule(URL, false).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), h.scheduler.ctx.queue.drain())
            .await
            .unwrap();

        assert_eq!(h.store.get(&url()).unwrap(), before);
        assert!(!h.scheduler.is_in_flight(&url()));
        h.scheduler.schedule(URL, false).await.unwrap();
        assert!(h.scheduler.is_in_flight(&url()));
    }

    #[tokio::test]
    async fn join_drains_every_queued_task_before_stopping() {
        let checker = FakeChecker::new(FakeCheck::Exit(0)).with_delay(Duration::from_millis(100));
        let config = SchedulerConfig {
            concurrency: 2,
            ..test_config()
        };
        let h = harness_with(checker, config);
        let urls = ["example.org/a/one", "example.org/a/two", "example.org/a/three"];
        for u in urls {
            h.resolver.set(&RepoUrl::parse(u).unwrap(), Protocol::Git, "123");
            h.scheduler.schedule(u, false).await.unwrap();
        }
        assert_eq!(h.scheduler.ctx.queue.len(), 3);

        h.scheduler.run();
        h.scheduler.join().await;

        assert_eq!(h.checker.finished(), 3);
        assert!(h.scheduler.ctx.queue.is_empty());
        assert!(!h.scheduler.is_running());
        for u in urls {
            let record = h.store.get(&RepoUrl::parse(u).unwrap()).unwrap();
            assert_eq!(record.status, Status::Compliant);
        }
    }

    #[tokio::test]
    async fn hanging_check_does_not_hold_up_other_repositories() {
        let config = SchedulerConfig {
            check_timeout_secs: 1,
            ..test_config()
        };
        let h = harness_with(FakeChecker::new(FakeCheck::Exit(0)), config);
        let stuck = RepoUrl::parse("example.org/slow/repo").unwrap();
        h.resolver.set(&stuck, Protocol::Git, "456");
        h.checker.set(&stuck, FakeCheck::Hang);
        h.scheduler.run();

        h.scheduler.schedule(stuck.as_str(), false).await.unwrap();
        h.scheduler.schedule(URL, false).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), h.scheduler.join())
            .await
            .unwrap();

        assert_eq!(h.store.get(&url()).unwrap().status, Status::Compliant);
        let stuck_record = h.store.get(&stuck).unwrap();
        assert_eq!(stuck_record.status, Status::Uninitialised);
        assert!(stuck_record.hash.is_none());
        let counts = h.scheduler.counts();
        assert_eq!((counts.checked, counts.failed), (1, 1));
    }

    #[tokio::test]
    async fn join_closes_the_queue() {
        let h = harness();
        h.scheduler.run();
        h.scheduler.join().await;

        h.scheduler.schedule(URL, false).await.unwrap();
        assert!(h.scheduler.ctx.queue.is_empty());
    }

    #[tokio::test]
    async fn join_without_run_discards_queued_tasks() {
        let h = harness();
        h.scheduler.schedule(URL, false).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), h.scheduler.join())
            .await
            .unwrap();

        assert!(h.scheduler.ctx.queue.is_empty());
        assert!(h.checker.calls().is_empty());
    }

    #[tokio::test]
    async fn run_twice_keeps_one_pool() {
        let h = harness();
        h.scheduler.run();
        h.scheduler.run();
        assert!(h.scheduler.is_running());
        h.scheduler.join().await;
    }
}
