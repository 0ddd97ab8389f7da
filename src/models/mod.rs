//! Data transfer objects exposed to callers.
//!
//! These structs serialize to the JSON printed by the `gitget` binary.
//! - `commit`: CommitInfo, CommitDetails, AuthorDetails

pub mod commit;

pub use commit::*;
