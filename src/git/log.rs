//! Parsing of the fixed-format `git log` query.
//!
//! The session asks git for exactly one commit using [`LOG_PRETTY`], which
//! prints six lines: commit id, commit epoch, subject, author name, author
//! email, author epoch.

use chrono::DateTime;

use crate::error::{GitgetError, Result};
use crate::models::{AuthorDetails, CommitDetails};

/// `--pretty` argument matching [`parse_log`]. `%s` never spans lines.
pub const LOG_PRETTY: &str = "--pretty=%H%n%ct%n%s%n%an%n%aE%n%at";

const LOG_FIELDS: usize = 6;
const SHORT_ID_LEN: usize = 7;

/// Format a unix timestamp as `YYYY-MM-DDTHH:MM:SSZ` (UTC).
///
/// Returns `None` for timestamps chrono cannot represent.
pub fn format_epoch(epoch: i64) -> Option<String> {
    DateTime::from_timestamp(epoch, 0).map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

/// Parse the output of `git log -n 1` run with [`LOG_PRETTY`].
pub fn parse_log(raw: &str) -> Result<(CommitDetails, AuthorDetails)> {
    let lines: Vec<&str> = raw.lines().collect();
    if lines.len() < LOG_FIELDS {
        return Err(GitgetError::MalformedLogOutput(format!(
            "expected {LOG_FIELDS} lines, got {}",
            lines.len()
        )));
    }

    let id = lines[0].trim();
    let commit_epoch = parse_epoch("commit epoch", lines[1])?;
    let author_epoch = parse_epoch("author epoch", lines[5])?;

    let commit = CommitDetails {
        id: id.to_owned(),
        id_short: id.chars().take(SHORT_ID_LEN).collect(),
        epoch: commit_epoch,
        date: date_of(commit_epoch)?,
        subject: lines[2].to_owned(),
    };
    let author = AuthorDetails {
        name: lines[3].to_owned(),
        email: lines[4].to_owned(),
        epoch: author_epoch,
        date: date_of(author_epoch)?,
    };
    Ok((commit, author))
}

fn parse_epoch(field: &str, value: &str) -> Result<i64> {
    value.trim().parse().map_err(|_| {
        GitgetError::MalformedLogOutput(format!("{field} is not an integer: {value:?}"))
    })
}

fn date_of(epoch: i64) -> Result<String> {
    format_epoch(epoch)
        .ok_or_else(|| GitgetError::MalformedLogOutput(format!("epoch {epoch} is out of range")))
}
