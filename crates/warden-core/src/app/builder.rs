//! SchedulerBuilder - wiring and start-up validation.
//!
//! Fails fast: a missing collaborator or an invalid config is reported by
//! `build()`, never later by a runner.

use std::sync::Arc;

use super::resolver::RepoKeyResolver;
use super::runner::RunnerContext;
use super::scheduler::Scheduler;
use super::status::RunStats;
use crate::config::{ConfigError, SchedulerConfig};
use crate::ports::{Clock, HashResolver, RemoteChecker, RepositoryStore, SystemClock};
use crate::queue::TaskQueue;

/// # Example
/// ```ignore
/// let scheduler = SchedulerBuilder::new()
///     .store(store)
///     .resolver(Arc::new(GitLsRemoteResolver::new()))
///     .checker(Arc::new(SshRemoteChecker::new(config.ssh.clone())))
///     .config(config.scheduler)
///     .build()?;
/// scheduler.run();
/// ```
#[derive(Default)]
pub struct SchedulerBuilder {
    store: Option<Arc<dyn RepositoryStore>>,
    resolver: Option<Arc<dyn HashResolver>>,
    checker: Option<Arc<dyn RemoteChecker>>,
    clock: Option<Arc<dyn Clock>>,
    config: SchedulerConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn RepositoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn HashResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn checker(mut self, checker: Arc<dyn RemoteChecker>) -> Self {
        self.checker = Some(checker);
        self
    }

    /// Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Scheduler, BuildError> {
        self.config.validate()?;
        let store = self.store.ok_or(BuildError::MissingCollaborator("store"))?;
        let resolver = self
            .resolver
            .ok_or(BuildError::MissingCollaborator("resolver"))?;
        let checker = self
            .checker
            .ok_or(BuildError::MissingCollaborator("checker"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let ctx = RunnerContext {
            queue: Arc::new(TaskQueue::new()),
            store,
            checker,
            clock,
            stats: RunStats::default(),
            poll_timeout: self.config.poll_timeout(),
            check_timeout: self.config.check_timeout(),
        };
        let resolver = RepoKeyResolver::new(resolver, self.config.resolve_timeout());
        Ok(Scheduler::from_parts(ctx, resolver, self.config))
    }
}
