//! RepoKeyResolver - which protocol reaches a repository, and where is HEAD?

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::domain::{CommitHash, Protocol, RepoUrl, ResolveError, ScheduleError};
use crate::ports::HashResolver;

/// Stateless wrapper around a [`HashResolver`] that applies the resolve
/// timeout and the protocol probe order.
///
/// "Not a repository" and "unreachable right now" are the same outcome here:
/// both end in `ScheduleError::InvalidRepository`.
#[derive(Clone)]
pub struct RepoKeyResolver {
    inner: Arc<dyn HashResolver>,
    timeout: Duration,
}

impl RepoKeyResolver {
    pub fn new(inner: Arc<dyn HashResolver>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Probe `https`, `git`, `http` in that order and return the first
    /// protocol that answers, together with the HEAD it reported.
    pub async fn resolve_protocol(
        &self,
        url: &RepoUrl,
    ) -> Result<(Protocol, CommitHash), ScheduleError> {
        for protocol in Protocol::PRIORITY {
            match self.try_resolve(protocol, url).await {
                Ok(hash) => {
                    debug!(%url, %protocol, %hash, "resolved remote head");
                    return Ok((protocol, hash));
                }
                Err(err) => {
                    debug!(%url, %protocol, error = %err, "protocol did not answer");
                }
            }
        }
        Err(ScheduleError::InvalidRepository(url.to_string()))
    }

    /// Resolve HEAD over a known protocol.
    pub async fn resolve_hash(
        &self,
        protocol: Protocol,
        url: &RepoUrl,
    ) -> Result<CommitHash, ScheduleError> {
        self.try_resolve(protocol, url).await.map_err(|err| {
            debug!(%url, %protocol, error = %err, "could not resolve remote head");
            ScheduleError::InvalidRepository(url.to_string())
        })
    }

    async fn try_resolve(
        &self,
        protocol: Protocol,
        url: &RepoUrl,
    ) -> Result<CommitHash, ResolveError> {
        tokio::time::timeout(self.timeout, self.inner.latest_hash(protocol, url))
            .await
            .map_err(|_| ResolveError::Timeout)?
    }
}
