use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommitHash, LintReport, Protocol, RepoUrl, RepositoryUpdate, Status};

/// One scheduled check: "lint this repository at this commit".
///
/// Immutable once created. `target_hash` is the remote HEAD seen when the
/// task was enqueued. It may be stale by the time the check runs and is
/// still the hash written back to the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    protocol: Protocol,
    url: RepoUrl,
    target_hash: CommitHash,
}

impl Task {
    pub fn new(protocol: Protocol, url: RepoUrl, target_hash: CommitHash) -> Self {
        Self {
            protocol,
            url,
            target_hash,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn url(&self) -> &RepoUrl {
        &self.url
    }

    pub fn target_hash(&self) -> &CommitHash {
        &self.target_hash
    }

    /// `<protocol>://<url>`, the argument handed to the linter.
    pub fn remote(&self) -> String {
        self.url.with_scheme(self.protocol)
    }

    /// Translate a successful check into the fields the store must write.
    pub fn apply_result(&self, report: &LintReport, now: DateTime<Utc>) -> RepositoryUpdate {
        RepositoryUpdate {
            url: self.url.clone(),
            hash: self.target_hash.clone(),
            status: Status::from_exit_code(report.exit_code),
            lint_code: report.exit_code,
            lint_output: report.lint_output.clone(),
            sbom_output: report.spdx_output.clone(),
            last_access: now,
        }
    }
}
