//! RemoteChecker port - runs the compliance linter somewhere else.

use async_trait::async_trait;

use crate::domain::{CheckError, LintReport, Protocol, RepoUrl};

/// One blocking compliance check of `<protocol>://<url>`.
///
/// The runner bounds every call with the check timeout and drops the future
/// when it fires, so implementations that spawn processes should kill them on
/// drop.
#[async_trait]
pub trait RemoteChecker: Send + Sync {
    async fn check(&self, protocol: Protocol, url: &RepoUrl) -> Result<LintReport, CheckError>;
}
