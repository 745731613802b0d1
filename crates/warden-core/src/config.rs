//! Configuration for the scheduler and the SSH check worker.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//!
//! ```toml
//! [scheduler]
//! concurrency = 6
//! check_timeout_secs = 900
//!
//! [ssh]
//! host = "wrk1.api.reuse.software"
//! user = "reuse"
//! identity_file = "~/.ssh/reuse_ed25519"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub scheduler: SchedulerConfig,
    pub ssh: SshConfig,
}

impl WardenConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()?;
        self.ssh.validate()
    }
}

/// Scheduling limits and timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of runners checking in parallel.
    pub concurrency: usize,

    /// How long an idle runner waits on the queue before looking at the stop
    /// signal again.
    pub poll_timeout_secs: u64,

    /// Hard bound on one remote check.
    pub check_timeout_secs: u64,

    /// Bound on one remote HEAD lookup.
    pub resolve_timeout_secs: u64,

    /// Forced re-checks of an up-to-date record are ignored while its last
    /// check is younger than this. 0 disables the cooldown.
    pub force_cooldown_secs: u64,

    /// Refuse to schedule repositories the store does not know as registered.
    pub require_registration: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: 6,
            poll_timeout_secs: 5,
            check_timeout_secs: 900,
            resolve_timeout_secs: 5,
            force_cooldown_secs: 0,
            require_registration: false,
        }
    }
}

impl SchedulerConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn force_cooldown(&self) -> Duration {
        Duration::from_secs(self.force_cooldown_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.concurrency must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("scheduler.poll_timeout_secs", self.poll_timeout_secs),
            ("scheduler.check_timeout_secs", self.check_timeout_secs),
            ("scheduler.resolve_timeout_secs", self.resolve_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Where and how the linter is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub identity_file: String,
    pub known_hosts_file: String,
    /// Remote command; receives `<protocol>://<url>` as its only argument.
    pub command: String,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: "wrk1.api.reuse.software".to_string(),
            port: 22,
            user: "reuse".to_string(),
            identity_file: "~/.ssh/reuse_ed25519".to_string(),
            known_hosts_file: "~/.ssh/known_hosts".to_string(),
            command: "reuse-lint-repo".to_string(),
        }
    }
}

impl SshConfig {
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    pub fn identity_path(&self) -> PathBuf {
        expand_home(&self.identity_file)
    }

    pub fn known_hosts_path(&self) -> PathBuf {
        expand_home(&self.known_hosts_file)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("ssh.host", &self.host),
            ("ssh.user", &self.user),
            ("ssh.command", &self.command),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("ssh.port must not be 0".to_string()));
        }
        Ok(())
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
