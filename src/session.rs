//! Checkout sessions.
//!
//! A `Gitget` session clones a repository at a branch, tag or commit into a
//! working directory it manages, and exposes the resulting commit metadata.
//!
//! Lifecycle: `Created → Acquiring → Ready → Released`, or
//! `Acquiring → Failed`. Nothing is retried; a caller that needs more
//! history constructs a new session with a larger depth.
//!
//! ```no_run
//! # async fn demo() -> gitget::Result<()> {
//! use gitget::{CheckoutRequest, Gitget, GitgetConfig};
//!
//! let config = GitgetConfig::from_env()?;
//! let request = CheckoutRequest::new("https://github.com/org/templates").with_branch("main");
//! let subject = Gitget::new(request, &config)?
//!     .scoped(|checkout| checkout.info().map(|info| info.commit.subject.clone()))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::GitgetConfig;
use crate::error::{CommandFailure, GitStage, GitgetError, Result};
use crate::git::{GitCli, GitCommand, GitRunner, LOG_PRETTY, parse_log, quote};
use crate::models::CommitInfo;
use crate::workdir;

/// Length of a full (SHA-1) commit id.
pub const COMMIT_ID_LEN: usize = 40;

const TEMP_SUFFIX: &str = ".gitget.git";

/// What to check out, and where.
///
/// Validated when a session is constructed, before any disk or network
/// access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Repository URL or path. git runs inside the working directory, so
    /// local paths should be absolute (or `file://` URLs).
    pub repository: String,
    /// History depth to clone; 0 clones the full history. Must not be negative.
    pub depth: i64,
    /// Branch or tag to clone; the remote's default branch when `None`.
    pub branch: Option<String>,
    /// Full 40 character commit id to check out after cloning.
    pub commit: Option<String>,
    /// Caller-owned directory that outlives the session. A unique temporary
    /// directory, removed on release, is used when `None`.
    pub target_directory: Option<PathBuf>,
    /// Delete an existing target directory before cloning.
    ///
    /// **Destructive**: this also applies to caller-supplied directories, and
    /// wipes whatever they contain.
    pub force: bool,
}

impl CheckoutRequest {
    /// A shallow (depth 1) checkout of the default branch.
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            depth: 1,
            branch: None,
            commit: None,
            target_directory: None,
            force: false,
        }
    }

    pub fn with_depth(mut self, depth: i64) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn with_target_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.target_directory = Some(path.into());
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.depth < 0 {
            return Err(GitgetError::InvalidArgument(format!(
                "depth must be 0 or a positive number, got {}",
                self.depth
            )));
        }
        if self.repository.is_empty() {
            return Err(GitgetError::InvalidArgument("repository must not be empty".to_owned()));
        }
        if let Some(commit) = &self.commit {
            let len = commit.chars().count();
            if len != COMMIT_ID_LEN {
                return Err(GitgetError::InvalidArgument(format!(
                    "commit id must be the full {COMMIT_ID_LEN} character id, \
                     abbreviated ids are not supported (got {len} characters)"
                )));
            }
        }
        // Values become argv entries; a leading dash would be read as an option.
        for (name, value) in [
            ("repository", Some(&self.repository)),
            ("branch", self.branch.as_ref()),
            ("commit", self.commit.as_ref()),
        ] {
            if let Some(value) = value.filter(|v| v.starts_with('-')) {
                return Err(GitgetError::InvalidArgument(format!(
                    "{name} must not start with '-': {}",
                    quote(value)
                )));
            }
        }
        if self.branch.as_deref() == Some("") {
            return Err(GitgetError::InvalidArgument("branch must not be empty".to_owned()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Acquiring,
    Ready,
    Failed,
    Released,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Acquiring => write!(f, "acquiring"),
            Self::Ready => write!(f, "ready"),
            Self::Failed => write!(f, "failed"),
            Self::Released => write!(f, "released"),
        }
    }
}

/// A single-use checkout session.
///
/// The session exclusively owns its working directory from [`acquire`]
/// until [`release`]. Session-owned (temporary) directories are removed on
/// release, on acquisition failure, and as a last resort when the session is
/// dropped; caller-supplied directories are kept unless
/// [`remove_directory`] is called.
///
/// [`acquire`]: Gitget::acquire
/// [`release`]: Gitget::release
/// [`remove_directory`]: Gitget::remove_directory
pub struct Gitget<R: GitRunner = GitCli> {
    request: CheckoutRequest,
    repodir: PathBuf,
    persist: bool,
    template: GitCommand,
    runner: R,
    state: SessionState,
    info: Option<CommitInfo>,
    released: bool,
}

impl Gitget<GitCli> {
    /// Validate `request` and set up a session driving the real `git`.
    pub fn new(request: CheckoutRequest, config: &GitgetConfig) -> Result<Self> {
        Self::with_runner(request, config, GitCli::from_config(config))
    }
}

impl<R: GitRunner> Gitget<R> {
    /// Validate `request` and set up a session issuing commands through `runner`.
    ///
    /// Only the path of the working directory is decided here; nothing is
    /// created until [`Gitget::acquire`].
    pub fn with_runner(request: CheckoutRequest, config: &GitgetConfig, runner: R) -> Result<Self> {
        request.validate()?;

        let (repodir, persist) = match &request.target_directory {
            Some(dir) => (resolve_target(dir)?, true),
            None => (temporary_repodir(), false),
        };

        Ok(Self {
            request,
            repodir,
            persist,
            template: GitCommand::template(config),
            runner,
            state: SessionState::Created,
            info: None,
            released: false,
        })
    }

    /// Filesystem path of the checkout.
    pub fn repodir(&self) -> &Path {
        &self.repodir
    }

    /// Commit metadata; `None` unless acquisition succeeded.
    pub fn info(&self) -> Option<&CommitInfo> {
        self.info.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the working directory survives the session.
    pub fn persist(&self) -> bool {
        self.persist
    }

    pub fn request(&self) -> &CheckoutRequest {
        &self.request
    }

    /// Prepare the directory, clone, optionally check out the requested
    /// commit, and read the commit metadata.
    ///
    /// On failure the session becomes `Failed`, no metadata is exposed, and a
    /// session-owned directory is removed right away. A caller-supplied
    /// directory is left as is for diagnosis.
    ///
    /// Fetching a commit by id relies on the server serving unadvertised
    /// objects. Servers that refuse such requests fail the same way as a
    /// commit that does not exist; the two cases cannot be told apart here.
    #[instrument(
        skip(self),
        fields(repository = %self.request.repository, repodir = %self.repodir.display())
    )]
    pub async fn acquire(&mut self) -> Result<&CommitInfo> {
        if self.state != SessionState::Created {
            return Err(GitgetError::InvalidArgument(format!(
                "session cannot be acquired in state {}",
                self.state
            )));
        }
        self.state = SessionState::Acquiring;

        match self.checkout().await {
            Ok(info) => {
                info!(commit = %info.commit.id_short, branch = %info.branch, "checkout ready");
                self.state = SessionState::Ready;
                Ok(self.info.insert(info))
            }
            Err(err) => {
                warn!(error = %err, "checkout failed");
                self.state = SessionState::Failed;
                if !self.persist {
                    if let Err(cleanup) = workdir::remove_async(&self.repodir).await {
                        warn!(error = %cleanup, "failed to remove checkout directory");
                    }
                }
                Err(err)
            }
        }
    }

    /// Acquire, run `f` on the ready session, then release.
    ///
    /// Release happens on every path. When acquisition fails its error is
    /// returned, and a subsequent cleanup failure is only logged.
    pub async fn scoped<T, F>(mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> T,
    {
        let acquired = self.acquire().await.map(|_| ());
        match acquired {
            Ok(()) => {
                let value = f(&self);
                self.release_async().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(cleanup) = self.release_async().await {
                    warn!(error = %cleanup, "cleanup after failed checkout also failed");
                }
                Err(err)
            }
        }
    }

    /// End the session, removing a session-owned directory.
    ///
    /// The removal runs on the calling thread; inside a runtime prefer
    /// [`Gitget::scoped`], which removes the directory on the blocking pool.
    pub fn release(mut self) -> Result<()> {
        if !self.mark_released() {
            return Ok(());
        }
        debug!(path = %self.repodir.display(), "removing checkout directory");
        workdir::remove(&self.repodir).map_err(|source| self.cleanup_failed(source))
    }

    /// Remove the working directory now, whoever owns it. No-op if absent.
    pub fn remove_directory(&self) -> Result<()> {
        workdir::remove(&self.repodir).map_err(|source| self.cleanup_failed(source))
    }

    async fn release_async(mut self) -> Result<()> {
        if !self.mark_released() {
            return Ok(());
        }
        debug!(path = %self.repodir.display(), "removing checkout directory");
        workdir::remove_async(&self.repodir)
            .await
            .map_err(|source| self.cleanup_failed(source))
    }

    /// Record the release; true when the directory is ours to remove.
    fn mark_released(&mut self) -> bool {
        self.released = true;
        if self.state != SessionState::Failed {
            self.state = SessionState::Released;
        }
        !self.persist
    }

    fn cleanup_failed(&self, source: io::Error) -> GitgetError {
        GitgetError::CleanupFailed {
            path: self.repodir.clone(),
            source,
        }
    }

    async fn checkout(&self) -> Result<CommitInfo> {
        workdir::ensure_clean_async(&self.repodir, self.request.force)
            .await
            .map_err(|source| GitgetError::CheckoutFailed {
                stage: GitStage::Prepare,
                command: quote(self.repodir.display()),
                source: CommandFailure::Io(source),
            })?;

        self.git(GitStage::Clone, self.clone_command()).await?;

        if let Some(commit) = &self.request.commit {
            self.git(
                GitStage::Fetch,
                self.template.with_args(["fetch", "--depth", "1", "origin", commit.as_str()]),
            )
            .await?;
            self.git(GitStage::Checkout, self.template.with_args(["checkout", commit.as_str()]))
                .await?;
        }

        let raw = self
            .git(GitStage::Log, self.template.with_args(["log", "-n", "1", LOG_PRETTY]))
            .await?;
        let (commit, author) = parse_log(&raw)?;

        let branch = match &self.request.branch {
            Some(branch) => branch.clone(),
            None => self
                .git(GitStage::Branch, self.template.with_args(["branch", "--show-current"]))
                .await?
                .trim_end()
                .to_owned(),
        };

        Ok(CommitInfo {
            branch,
            commit,
            author,
        })
    }

    fn clone_command(&self) -> GitCommand {
        let mut args: Vec<OsString> = vec!["clone".into()];
        if self.request.depth > 0 {
            args.push("--depth".into());
            args.push(self.request.depth.to_string().into());
        }
        if let Some(branch) = &self.request.branch {
            args.push("--branch".into());
            args.push(branch.into());
        }
        args.push((&self.request.repository).into());
        // The target goes to git as raw bytes; later subcommands run inside it.
        args.push(self.repodir.as_os_str().to_owned());
        self.template.with_args(args)
    }

    async fn git(&self, stage: GitStage, command: GitCommand) -> Result<String> {
        debug!(%stage, command = %command, "running git");
        self.runner
            .run(&self.repodir, &command)
            .await
            .map_err(|source| GitgetError::CheckoutFailed {
                stage,
                command: command.to_string(),
                source,
            })
    }
}

/// Absolute form of a caller-supplied directory, without touching the disk.
fn resolve_target(dir: &Path) -> Result<PathBuf> {
    std::path::absolute(dir).map_err(|err| {
        GitgetError::InvalidArgument(format!(
            "target directory {} cannot be resolved: {err}",
            dir.display()
        ))
    })
}

fn temporary_repodir() -> PathBuf {
    std::env::temp_dir().join(format!("{}{TEMP_SUFFIX}", Uuid::new_v4().simple()))
}

impl<R: GitRunner> Drop for Gitget<R> {
    fn drop(&mut self) {
        if self.released || self.persist {
            return;
        }
        if let Err(err) = workdir::remove(&self.repodir) {
            warn!(
                path = %self.repodir.display(),
                error = %err,
                "failed to remove checkout directory"
            );
        }
    }
}

impl<R: GitRunner> fmt::Debug for Gitget<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gitget")
            .field("request", &self.request)
            .field("repodir", &self.repodir)
            .field("persist", &self.persist)
            .field("state", &self.state)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}
