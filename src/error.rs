//! Error types for checkout sessions.
//!
//! `GitgetError` is the single error kind surfaced to callers. Failures of
//! individual git subcommands are carried as a `CommandFailure` inside
//! `GitgetError::CheckoutFailed`, together with the `GitStage` that failed.
//!
//! - `InvalidArgument` → rejected at construction, before any I/O
//! - `CheckoutFailed` → directory preparation or a git subcommand failed
//! - `MalformedLogOutput` → `git log` succeeded but could not be parsed
//! - `CleanupFailed` → the checkout directory could not be removed
//! - `Config` → invalid `GITGET_*` setting

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Step of the checkout sequence, for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitStage {
    /// Creating or force-clearing the working directory.
    Prepare,
    /// `git clone`.
    Clone,
    /// `git fetch` of the requested commit.
    Fetch,
    /// `git checkout` of the requested commit.
    Checkout,
    /// `git log` query for commit metadata.
    Log,
    /// `git branch --show-current`.
    Branch,
}

impl fmt::Display for GitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepare => write!(f, "prepare"),
            Self::Clone => write!(f, "clone"),
            Self::Fetch => write!(f, "fetch"),
            Self::Checkout => write!(f, "checkout"),
            Self::Log => write!(f, "log"),
            Self::Branch => write!(f, "branch"),
        }
    }
}

/// Why a single git invocation did not succeed.
#[derive(Error, Debug)]
pub enum CommandFailure {
    /// git ran and exited unsuccessfully. `stderr` has newlines escaped.
    #[error("process error ({}), STDERR: {stderr}", exit_label(.code))]
    Process { code: Option<i32>, stderr: String },

    /// git did not finish within the configured timeout and was killed.
    /// `stderr` holds what git wrote before that, newlines escaped.
    #[error("timed out after {after:?}, STDERR: {stderr}")]
    Timeout { after: Duration, stderr: String },

    #[error("failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl CommandFailure {
    /// Whether the failure was a timeout rather than an exit status.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_owned(),
    }
}

#[derive(Error, Debug)]
pub enum GitgetError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("checkout failed at {stage}: {source}")]
    CheckoutFailed {
        stage: GitStage,
        /// Rendered command line, shell-quoted.
        command: String,
        #[source]
        source: CommandFailure,
    },

    #[error("malformed git log output: {0}")]
    MalformedLogOutput(String),

    #[error("failed to remove {}: {source}", path.display())]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GitgetError {
    /// The failed stage, for `CheckoutFailed` errors.
    pub fn stage(&self) -> Option<GitStage> {
        match self {
            Self::CheckoutFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GitgetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_failure_message_keeps_stderr() {
        let err = GitgetError::CheckoutFailed {
            stage: GitStage::Clone,
            command: "git clone x y".to_owned(),
            source: CommandFailure::Process {
                code: Some(128),
                stderr: "fatal: repository 'x' does not exist".to_owned(),
            },
        };
        assert_eq!(
            err.to_string(),
            "checkout failed at clone: process error (exit code 128), \
             STDERR: fatal: repository 'x' does not exist"
        );
        assert_eq!(err.stage(), Some(GitStage::Clone));
    }

    #[test]
    fn timeout_is_classified_as_checkout_failure() {
        let err = GitgetError::CheckoutFailed {
            stage: GitStage::Fetch,
            command: "git fetch".to_owned(),
            source: CommandFailure::Timeout {
                after: Duration::from_secs(5),
                stderr: "remote: Counting objects".to_owned(),
            },
        };
        assert_eq!(
            err.to_string(),
            "checkout failed at fetch: timed out after 5s, STDERR: remote: Counting objects"
        );
        match err {
            GitgetError::CheckoutFailed { source, .. } => assert!(source.is_timeout()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn stage_serializes_snake_case() {
        let json = serde_json::to_string(&GitStage::Checkout).unwrap();
        assert_eq!(json, "\"checkout\"");
    }
}
