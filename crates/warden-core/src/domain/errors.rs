//! Error types, one enum per seam.
//!
//! Only [`ScheduleError`] reaches callers of the scheduler. Everything a
//! runner hits ([`CheckError`], store failures while applying a result) is
//! logged and absorbed: the unchanged record is the failure signal.

use thiserror::Error;

use super::RepoUrl;

/// Errors surfaced synchronously by `Scheduler::schedule`.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Not a reachable git repository under any tried protocol. Terminal for
    /// the request, never retried by the scheduler.
    #[error("not a git repository: {0}")]
    InvalidRepository(String),

    #[error("repository is not registered: {0}")]
    Unregistered(RepoUrl),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure of one remote HEAD lookup.
///
/// The resolver folds all of these into `ScheduleError::InvalidRepository`;
/// the variants only exist so logs can tell them apart.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("remote answered but is not a git repository: {0}")]
    NotARepository(String),

    #[error("remote did not answer within the resolve timeout")]
    Timeout,

    #[error("could not run the resolver: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of one remote compliance check.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The execution channel failed, not the linter.
    #[error("transport to the check worker failed: {stderr}")]
    TransportFailure { stderr: String },

    #[error("check did not finish within the check timeout")]
    Timeout,

    /// The remote produced output outside the fixed result schema.
    #[error("malformed check result: {0}")]
    MalformedResult(String),

    #[error("could not run the checker: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record for {0}")]
    NotFound(RepoUrl),

    #[error("repository store failure: {0}")]
    Backend(String),
}
