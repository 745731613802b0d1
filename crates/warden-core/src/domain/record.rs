//! Repository records as the store keeps them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RepoUrl;

/// Commit identifier of a remote HEAD.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitHash(String);

impl CommitHash {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Compliance status of a repository.
///
/// `Unregistered` is virtual: it stands for "no record" and is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Unregistered,
    Uninitialised,
    NonCompliant,
    Compliant,
}

impl Status {
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            Status::Compliant
        } else {
            Status::NonCompliant
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Unregistered => "unregistered",
            Status::Uninitialised => "uninitialised",
            Status::NonCompliant => "non-compliant",
            Status::Compliant => "compliant",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One repository as the store keeps it.
///
/// Invariant: `hash.is_none()` implies `status == Uninitialised`. Records only
/// leave that state through [`RepositoryRecord::apply`], which always sets a
/// hash together with a compliant/non-compliant status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub url: RepoUrl,
    pub hash: Option<CommitHash>,
    pub status: Status,
    pub lint_code: Option<i32>,
    pub lint_output: Option<String>,
    pub sbom_output: Option<String>,
    pub last_access: Option<DateTime<Utc>>,
}

impl RepositoryRecord {
    /// Freshly registered, never checked.
    pub fn new(url: RepoUrl) -> Self {
        Self {
            url,
            hash: None,
            status: Status::Uninitialised,
            lint_code: None,
            lint_output: None,
            sbom_output: None,
            last_access: None,
        }
    }

    pub fn apply(&mut self, update: RepositoryUpdate) {
        self.url = update.url;
        self.hash = Some(update.hash);
        self.status = update.status;
        self.lint_code = Some(update.lint_code);
        self.lint_output = Some(update.lint_output);
        self.sbom_output = Some(update.sbom_output);
        self.last_access = Some(update.last_access);
    }
}

/// Fields written by one completed check.
///
/// `url` is carried along so the record shows the casing used by the most
/// recent check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryUpdate {
    pub url: RepoUrl,
    pub hash: CommitHash,
    pub status: Status,
    pub lint_code: i32,
    pub lint_output: String,
    pub sbom_output: String,
    pub last_access: DateTime<Utc>,
}
