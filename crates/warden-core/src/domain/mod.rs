//! Domain model (urls, records, tasks, decisions, errors).

pub mod decision;
pub mod errors;
pub mod protocol;
pub mod record;
pub mod repo_url;
pub mod report;
pub mod task;

pub use decision::{Decision, DecisionInput, EnqueueReason, SkipReason, decide};
pub use errors::{CheckError, ResolveError, ScheduleError, StoreError};
pub use protocol::Protocol;
pub use record::{CommitHash, RepositoryRecord, RepositoryUpdate, Status};
pub use repo_url::{RepoUrl, RepoUrlError};
pub use report::LintReport;
pub use task::Task;
