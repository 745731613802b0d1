//! Result payload of one remote compliance check.

use serde::{Deserialize, Serialize};

use super::errors::CheckError;

/// What the remote lint command prints on stdout, as JSON.
///
/// The schema is fixed. Anything that does not deserialize into it is a
/// [`CheckError::MalformedResult`]; there is no partial recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    pub exit_code: i32,
    pub lint_output: String,
    pub spdx_output: String,
}

impl LintReport {
    pub fn parse(stdout: &str) -> Result<Self, CheckError> {
        serde_json::from_str(stdout.trim())
            .map_err(|e| CheckError::MalformedResult(format!("json decode: {e}")))
    }
}
