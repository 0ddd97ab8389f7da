//! Fixture repositories for integration tests.
//!
//! Built with git2 inside a temporary directory and served to the real `git`
//! executable through a `file://` URL, so shallow clones behave as they do
//! against a remote.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{Repository, RepositoryInitOptions, Signature, Time};
use tempfile::TempDir;

pub const AUTHOR: &str = "Jane Doe";
pub const EMAIL: &str = "jane@example.com";
pub const FIRST_EPOCH: i64 = 1234567890;

pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
    /// Commit ids, oldest first.
    pub commits: Vec<String>,
}

impl Fixture {
    /// A repository on `main` with three commits; `v1.0` tags the first one.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("origin");

        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(&path, &opts).unwrap();
        // allow fetching any commit by id, whatever the protocol version
        repo.config()
            .unwrap()
            .set_bool("uploadpack.allowAnySHA1InWant", true)
            .unwrap();

        let commits = vec![
            commit(&repo, "README.md", "one\n", "Initial commit", FIRST_EPOCH),
            commit(&repo, "README.md", "two\n", "Second commit", FIRST_EPOCH + 60),
            commit(&repo, "README.md", "three\n", "Third commit", FIRST_EPOCH + 120),
        ];

        let first = repo
            .find_object(git2::Oid::from_str(&commits[0]).unwrap(), None)
            .unwrap();
        repo.tag_lightweight("v1.0", &first, false).unwrap();

        Self { dir, path, commits }
    }

    pub fn url(&self) -> String {
        format!("file://{}", self.path.display())
    }

    pub fn head(&self) -> &str {
        self.commits.last().unwrap()
    }

    /// A path inside the fixture's temporary directory that does not exist yet.
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn commit(repo: &Repository, file: &str, content: &str, message: &str, epoch: i64) -> String {
    let workdir = repo.workdir().unwrap();
    std::fs::write(workdir.join(file), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(file)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let signature = Signature::new(AUTHOR, EMAIL, &Time::new(epoch, 0)).unwrap();
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parents: Vec<&git2::Commit> = parents.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap()
        .to_string()
}

/// Number of commits reachable from HEAD in a checkout.
pub fn history_len(repodir: &Path) -> usize {
    let output = Command::new("git")
        .args(["rev-list", "--count", "HEAD"])
        .current_dir(repodir)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap().trim().parse().unwrap()
}
