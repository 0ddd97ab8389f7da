//! Invocation of the `git` executable.
//!
//! `GitCommand` is a program plus argv; `GitRunner` is the port a session
//! issues every subcommand through. `GitCli` is the live runner: it spawns
//! the process without a shell and bounds it by the configured timeout.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::GitgetConfig;
use crate::error::CommandFailure;
use crate::git::quote::quote;

const GIT: &str = "git";

/// A program and its arguments, one entry per argv slot.
///
/// Arguments are OS strings so that paths reach git byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl GitCommand {
    /// The outer invocation shared by every subcommand of a session:
    /// `git -c http.sslVerify=<bool> -c http.proxy=<proxy>`.
    pub fn template(config: &GitgetConfig) -> Self {
        Self {
            program: GIT.to_owned(),
            args: vec![
                "-c".into(),
                format!("http.sslVerify={}", config.ssl_verify).into(),
                "-c".into(),
                format!("http.proxy={}", config.proxy).into(),
            ],
        }
    }

    /// A copy of this command with `args` appended.
    pub fn with_args<I, S>(&self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut command = self.clone();
        command.args.extend(args.into_iter().map(Into::into));
        command
    }

    /// The git subcommand, skipping leading `-c <key=value>` options.
    pub fn subcommand(&self) -> Option<&str> {
        let mut args = self.args.iter();
        while let Some(arg) = args.next() {
            if arg == "-c" {
                args.next();
                continue;
            }
            return arg.to_str();
        }
        None
    }
}

impl fmt::Display for GitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// Runs git commands on behalf of a session.
///
/// Implementations return captured stdout on success. A non-zero exit, a
/// timeout, or a spawn failure is reported as a `CommandFailure`.
pub trait GitRunner: Send + Sync {
    fn run(
        &self,
        cwd: &Path,
        command: &GitCommand,
    ) -> impl Future<Output = Result<String, CommandFailure>> + Send;
}

/// Live runner spawning the real executable through tokio.
///
/// On timeout only the `git` process itself is killed. Transport helpers it
/// started (`git-remote-https`, `ssh`) are not part of a process group we
/// own and may outlive it briefly.
#[derive(Debug, Clone)]
pub struct GitCli {
    timeout: Duration,
}

impl GitCli {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &GitgetConfig) -> Self {
        Self::new(config.timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl GitRunner for GitCli {
    async fn run(&self, cwd: &Path, command: &GitCommand) -> Result<String, CommandFailure> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(cwd)
            // Fail instead of blocking on a credential prompt.
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %command, cwd = %cwd.display(), "spawning");
        let mut child = cmd.spawn().map_err(CommandFailure::Spawn)?;
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let finished = timeout(self.timeout, async {
            let (status, (), ()) = tokio::try_join!(
                child.wait(),
                drain(stdout_pipe, &mut stdout),
                drain(stderr_pipe, &mut stderr),
            )?;
            Ok::<_, io::Error>(status)
        })
        .await;

        let status = match finished {
            Ok(result) => result.map_err(CommandFailure::Io)?,
            Err(_) => {
                if let Err(err) = child.start_kill() {
                    warn!(error = %err, "failed to kill timed out git");
                }
                return Err(CommandFailure::Timeout {
                    after: self.timeout,
                    stderr: escape_stderr(&stderr),
                });
            }
        };

        if !status.success() {
            return Err(CommandFailure::Process {
                code: status.code(),
                stderr: escape_stderr(&stderr),
            });
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Read `pipe` to the end into `buf`. Bytes read before cancellation stay in `buf`.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>, buf: &mut Vec<u8>) -> io::Result<()> {
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(buf).await?;
    }
    Ok(())
}

fn escape_stderr(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim_end().replace('\n', "\\n")
}
