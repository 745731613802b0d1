//! SshRemoteChecker - runs the linter on the check worker over SSH.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::SshConfig;
use crate::domain::{CheckError, LintReport, Protocol, RepoUrl};
use crate::ports::RemoteChecker;

/// Exit status ssh reserves for its own failures (connection, auth, ...).
pub const SSH_TRANSPORT_FAILURE: i32 = 255;

/// `ssh -i <key> -p <port> ... <user>@<host> <command> <protocol>://<url>`
///
/// The remote command prints one JSON [`LintReport`] on stdout. Its own exit
/// status is irrelevant except for 255, which means ssh never got the command
/// running. The child is killed when the future is dropped.
#[derive(Debug, Clone)]
pub struct SshRemoteChecker {
    config: SshConfig,
    ssh: String,
}

impl SshRemoteChecker {
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            ssh: "ssh".to_string(),
        }
    }

    /// Use a specific ssh binary.
    pub fn with_binary(mut self, ssh: impl Into<String>) -> Self {
        self.ssh = ssh.into();
        self
    }

    fn command(&self, protocol: Protocol, url: &RepoUrl) -> Command {
        let known_hosts = format!(
            "UserKnownHostsFile={}",
            self.config.known_hosts_path().display()
        );
        let mut cmd = Command::new(&self.ssh);
        cmd.arg("-i")
            .arg(self.config.identity_path())
            .arg("-p")
            .arg(self.config.port.to_string())
            .args(["-o", "BatchMode=yes"])
            .args(["-o", "StrictHostKeyChecking=accept-new"])
            .arg("-o")
            .arg(known_hosts)
            .arg(self.config.destination())
            .arg(&self.config.command)
            .arg(url.with_scheme(protocol))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl RemoteChecker for SshRemoteChecker {
    async fn check(&self, protocol: Protocol, url: &RepoUrl) -> Result<LintReport, CheckError> {
        debug!(
            %url,
            destination = %self.config.destination(),
            "running remote lint"
        );
        let output = self.command(protocol, url).output().await?;
        classify(
            output.status.code(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }
}

/// Map a finished ssh invocation to a check result.
pub(crate) fn classify(
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<LintReport, CheckError> {
    match code {
        Some(SSH_TRANSPORT_FAILURE) => Err(CheckError::TransportFailure {
            stderr: stderr.to_string(),
        }),
        None => Err(CheckError::TransportFailure {
            stderr: format!("ssh terminated by signal: {stderr}"),
        }),
        Some(_) => LintReport::parse(stdout),
    }
}
