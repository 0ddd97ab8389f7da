//! gitget - managed, temporary checkouts of git repositories
//!
//! Clones a repository at a branch, tag or commit into a working directory,
//! reads the resulting commit metadata, and removes the directory again when
//! the session ends (unless the caller supplied the directory).
//!
//! - `session`: `Gitget` checkout sessions and `CheckoutRequest`
//! - `git`: command runner, argument quoting, `git log` parsing
//! - `workdir`: creating, force-clearing and removing working directories
//! - `config`: `GITGET_*` transport settings
//! - `models`: `CommitInfo` returned to callers
//! - `error`: `GitgetError` and failure classification

pub mod config;
pub mod error;
pub mod git;
pub mod models;
pub mod session;
pub mod workdir;

pub use config::GitgetConfig;
pub use error::{CommandFailure, GitStage, GitgetError, Result};
pub use git::{GitCli, GitCommand, GitRunner, format_epoch, parse_log, quote};
pub use models::{AuthorDetails, CommitDetails, CommitInfo};
pub use session::{CheckoutRequest, Gitget, SessionState};
