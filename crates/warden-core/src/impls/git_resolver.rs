//! GitLsRemoteResolver - `git ls-remote` based HashResolver

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::{CommitHash, Protocol, RepoUrl, ResolveError};
use crate::ports::HashResolver;

/// Runs `git ls-remote <protocol>://<url> HEAD`.
///
/// Terminal prompts are disabled so a private or missing repository fails
/// instead of asking for credentials. The child is killed when the future is
/// dropped (the resolve timeout does that).
#[derive(Debug, Clone)]
pub struct GitLsRemoteResolver {
    git: String,
}

impl GitLsRemoteResolver {
    pub fn new() -> Self {
        Self {
            git: "git".to_string(),
        }
    }

    /// Use a specific git binary.
    pub fn with_binary(git: impl Into<String>) -> Self {
        Self { git: git.into() }
    }

    fn command(&self, protocol: Protocol, url: &RepoUrl) -> Command {
        let mut cmd = Command::new(&self.git);
        cmd.arg("ls-remote")
            .arg(url.with_scheme(protocol))
            .arg("HEAD")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for GitLsRemoteResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HashResolver for GitLsRemoteResolver {
    async fn latest_hash(
        &self,
        protocol: Protocol,
        url: &RepoUrl,
    ) -> Result<CommitHash, ResolveError> {
        let output = self.command(protocol, url).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::NotARepository(stderr.trim().to_string()));
        }
        parse_ls_remote(&String::from_utf8_lossy(&output.stdout))
    }
}

/// First token of `<hash>\tHEAD`.
pub(crate) fn parse_ls_remote(stdout: &str) -> Result<CommitHash, ResolveError> {
    stdout
        .split_whitespace()
        .next()
        .map(CommitHash::new)
        .ok_or_else(|| ResolveError::NotARepository("empty ls-remote output".to_string()))
}
