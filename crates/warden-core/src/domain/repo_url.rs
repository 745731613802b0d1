//! Canonical repository identifiers.
//!
//! A repository is identified by `host/namespace/project`: the HTTP(S) URL
//! without the scheme and without a `.git` suffix. The identifier is the
//! dedup key for the whole system, so two spellings that only differ in case
//! must land on the same key.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoUrlError {
    #[error("repository url is empty")]
    Empty,

    #[error("repository url contains whitespace: {0}")]
    Whitespace(String),

    #[error("expected host/namespace/project, got {0}")]
    TooShort(String),

    #[error("host does not look like a domain: {0}")]
    InvalidHost(String),
}

/// `host/namespace/project`, normalised.
///
/// Equality and hashing go through [`RepoUrl::key`], which is lowercase; the
/// display form keeps whatever casing the caller used most recently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoUrl {
    display: String,
    key: String,
}

impl RepoUrl {
    pub fn parse(raw: &str) -> Result<Self, RepoUrlError> {
        let mut s = raw.trim();
        if s.is_empty() {
            return Err(RepoUrlError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(RepoUrlError::Whitespace(raw.to_string()));
        }
        if let Some((_, rest)) = s.split_once("://") {
            s = rest;
        }
        s = s.trim_end_matches('/');
        s = s.strip_suffix(".git").unwrap_or(s);

        let segments: Vec<&str> = s.split('/').collect();
        if segments.len() < 3 || segments.iter().any(|seg| seg.is_empty()) {
            return Err(RepoUrlError::TooShort(raw.to_string()));
        }
        let host = segments[0];
        if !host.contains('.') || host.starts_with('.') || host.ends_with('.') {
            return Err(RepoUrlError::InvalidHost(host.to_string()));
        }

        Ok(Self {
            display: s.to_string(),
            key: s.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Lowercase dedup/lookup key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn with_scheme(&self, protocol: super::Protocol) -> String {
        format!("{protocol}://{}", self.display)
    }
}

impl PartialEq for RepoUrl {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for RepoUrl {}

impl std::hash::Hash for RepoUrl {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl TryFrom<String> for RepoUrl {
    type Error = RepoUrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RepoUrl> for String {
    fn from(url: RepoUrl) -> Self {
        url.display
    }
}
