//! Working directory lifecycle for checkouts.
//!
//! The async variants run on tokio's blocking pool so that a recursive
//! delete of a large checkout does not stall a runtime worker.

use std::io;
use std::path::Path;

use tokio::task;
use tracing::debug;

/// Prepare `path` for a clone.
///
/// With `force`, an existing `path` is recursively deleted first. The
/// directory (and missing parents) is then created with owner-only
/// permissions. An existing directory is left as is when not forced; git
/// itself refuses to clone into a non-empty one.
pub fn ensure_clean(path: &Path, force: bool) -> io::Result<()> {
    if force && path.exists() {
        debug!(path = %path.display(), "force-removing existing directory");
        std::fs::remove_dir_all(path)?;
    }
    create_private_dir(path)
}

/// Recursively delete `path`. A missing `path` is not an error.
pub fn remove(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

/// [`ensure_clean`] on the blocking pool.
pub async fn ensure_clean_async(path: &Path, force: bool) -> io::Result<()> {
    let path = path.to_path_buf();
    task::spawn_blocking(move || ensure_clean(&path, force))
        .await
        .map_err(io::Error::other)?
}

/// [`remove`] through `tokio::fs`.
pub async fn remove_async(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directory_with_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a/b/checkout");
        ensure_clean(&path, false).unwrap();
        assert!(path.is_dir());
        // idempotent
        ensure_clean(&path, false).unwrap();
        assert!(path.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn creates_owner_only_directory() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("private");
        ensure_clean(&path, false).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn keeps_contents_without_force() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("keep.txt");
        std::fs::write(&file, "data").unwrap();
        ensure_clean(tmp.path(), false).unwrap();
        assert!(file.exists());
    }

    #[test]
    fn force_clears_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("checkout");
        std::fs::create_dir_all(path.join("nested")).unwrap();
        std::fs::write(path.join("nested/old.txt"), "data").unwrap();
        ensure_clean(&path, true).unwrap();
        assert!(path.is_dir());
        assert_eq!(std::fs::read_dir(&path).unwrap().count(), 0);
    }

    #[test]
    fn remove_is_a_noop_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gone");
        remove(&path).unwrap();
        std::fs::create_dir_all(path.join("x")).unwrap();
        remove(&path).unwrap();
        assert!(!path.exists());
        remove(&path).unwrap();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn async_variants_match_blocking_ones() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("checkout");
        std::fs::create_dir_all(path.join("nested")).unwrap();
        std::fs::write(path.join("nested/old.txt"), "data").unwrap();

        ensure_clean_async(&path, false).await.unwrap();
        assert!(path.join("nested/old.txt").exists());
        ensure_clean_async(&path, true).await.unwrap();
        assert_eq!(std::fs::read_dir(&path).unwrap().count(), 0);

        remove_async(&path).await.unwrap();
        assert!(!path.exists());
        remove_async(&path).await.unwrap();
    }
}
