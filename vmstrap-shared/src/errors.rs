//! Error taxonomy for the provisioning pipeline.
//!
//! Variants are grouped by where a failure comes from, not by how it is
//! handled: every error is terminal for the run.

use std::io;
use thiserror::Error;

/// Result alias used across all vmstrap crates.
pub type VmstrapResult<T> = Result<T, VmstrapError>;

#[derive(Debug, Error)]
pub enum VmstrapError {
    /// A safety predicate does not hold; nothing has been touched yet.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Transport-level failure talking to the artifact API.
    #[error("network error: {0}")]
    Network(String),

    /// The artifact API answered, but not with something usable.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// An external tool ran and exited unsuccessfully.
    #[error("command `{program} {args}` failed with {status}{}", format_stderr(.stderr))]
    Command {
        program: String,
        args: String,
        status: String,
        stderr: String,
    },

    /// An external tool could not be started at all.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// The operator declined to continue at the confirmation gate.
    #[error("aborted: {0}")]
    Aborted(String),

    #[error("internal error: {0}")]
    Internal(String),
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

impl VmstrapError {
    /// Build a `Command` error from the pieces of a finished process.
    pub fn command(
        program: impl Into<String>,
        args: &[String],
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Command {
            program: program.into(),
            args: args.join(" "),
            status: status.into(),
            stderr: stderr.into(),
        }
    }

    /// Build a `Spawn` error.
    pub fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// True when the failure happened before any side effect on the host.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}
