//! Test doubles for the collaborator ports.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{CheckError, CommitHash, LintReport, Protocol, RepoUrl, ResolveError};
use crate::ports::{HashResolver, RemoteChecker};

/// Resolver answering from a table; unknown (protocol, url) pairs are not
/// repositories.
#[derive(Default)]
pub struct FakeResolver {
    heads: Mutex<HashMap<(Protocol, String), CommitHash>>,
    calls: Mutex<Vec<(Protocol, RepoUrl)>>,
    delay: Option<Duration>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set(&self, url: &RepoUrl, protocol: Protocol, hash: &str) {
        self.heads
            .lock()
            .unwrap()
            .insert((protocol, url.key().to_string()), CommitHash::new(hash));
    }

    pub fn calls(&self) -> Vec<(Protocol, RepoUrl)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HashResolver for FakeResolver {
    async fn latest_hash(
        &self,
        protocol: Protocol,
        url: &RepoUrl,
    ) -> Result<CommitHash, ResolveError> {
        self.calls.lock().unwrap().push((protocol, url.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let head = self
            .heads
            .lock()
            .unwrap()
            .get(&(protocol, url.key().to_string()))
            .cloned();
        head.ok_or_else(|| ResolveError::NotARepository(url.to_string()))
    }
}

/// Scripted behaviour of one fake check.
#[derive(Debug, Clone)]
pub enum FakeCheck {
    Exit(i32),
    TransportFailure,
    Malformed,
    Hang,
    Panic,
}

pub struct FakeChecker {
    default: FakeCheck,
    overrides: Mutex<HashMap<String, FakeCheck>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(Protocol, RepoUrl)>>,
    finished: AtomicUsize,
}

impl FakeChecker {
    pub fn new(default: FakeCheck) -> Self {
        Self {
            default,
            overrides: Mutex::new(HashMap::new()),
            delay: None,
            calls: Mutex::new(Vec::new()),
            finished: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set(&self, url: &RepoUrl, check: FakeCheck) {
        self.overrides
            .lock()
            .unwrap()
            .insert(url.key().to_string(), check);
    }

    pub fn calls(&self) -> Vec<(Protocol, RepoUrl)> {
        self.calls.lock().unwrap().clone()
    }

    /// Checks that ran to completion (returned anything).
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteChecker for FakeChecker {
    async fn check(&self, protocol: Protocol, url: &RepoUrl) -> Result<LintReport, CheckError> {
        self.calls.lock().unwrap().push((protocol, url.clone()));
        let script = self
            .overrides
            .lock()
            .unwrap()
            .get(url.key())
            .cloned()
            .unwrap_or_else(|| self.default.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match script {
            FakeCheck::Exit(exit_code) => Ok(LintReport {
                exit_code,
                lint_output: format!("lint of {url}"),
                spdx_output: format!("spdx of {url}"),
            }),
            FakeCheck::TransportFailure => Err(CheckError::TransportFailure {
                stderr: "ssh: connect to host port 22: Connection refused".to_string(),
            }),
            FakeCheck::Malformed => LintReport::parse("not json"),
            FakeCheck::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(CheckError::Timeout)
            }
            FakeCheck::Panic => panic!("checker blew up"),
        };
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}
