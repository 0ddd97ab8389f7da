use serde::{Deserialize, Serialize};

/// Metadata of the commit a checkout ended up on.
///
/// Produced once per session from `git log` (and `git branch --show-current`
/// when no branch was requested); read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Requested branch or tag, or the checked-out branch. Empty on a detached HEAD.
    pub branch: String,
    pub commit: CommitDetails,
    pub author: AuthorDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetails {
    /// Full commit id.
    pub id: String,
    /// First 7 characters of `id`.
    pub id_short: String,
    /// Committer timestamp, seconds since the unix epoch.
    pub epoch: i64,
    /// `epoch` as `YYYY-MM-DDTHH:MM:SSZ` (UTC).
    pub date: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDetails {
    pub name: String,
    pub email: String,
    pub epoch: i64,
    pub date: String,
}
