//! Git transport protocols a repository can be reached over.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport used both to resolve the remote HEAD and to hand the repository
/// to the linter (`<protocol>://<url>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Https,
    Git,
    Http,
}

impl Protocol {
    /// Probe order used when a repository is first resolved.
    pub const PRIORITY: [Protocol; 3] = [Protocol::Https, Protocol::Git, Protocol::Http];

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Https => "https",
            Protocol::Git => "git",
            Protocol::Http => "http",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
