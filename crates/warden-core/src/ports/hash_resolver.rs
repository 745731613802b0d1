//! HashResolver port - latest commit of a remote's default branch.

use async_trait::async_trait;

use crate::domain::{CommitHash, Protocol, RepoUrl, ResolveError};

/// Resolves `HEAD` of `<protocol>://<url>`.
///
/// Implementations do not need to bound their own runtime; the
/// `RepoKeyResolver` wraps every call in the resolve timeout.
#[async_trait]
pub trait HashResolver: Send + Sync {
    async fn latest_hash(
        &self,
        protocol: Protocol,
        url: &RepoUrl,
    ) -> Result<CommitHash, ResolveError>;
}
