use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::config::Config;
use crate::error::{MirrorError, Result};

/// The external git actions a mirror run needs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// `git clone --mirror <url> <target>`
    async fn clone_mirror(&self, url: &str, target: &Path) -> Result<()>;

    /// `git remote update`, run inside an existing mirror
    async fn remote_update(&self, mirror_dir: &Path) -> Result<()>;

    /// The `remote.origin.url` recorded in an existing mirror, if any
    async fn origin_url(&self, mirror_dir: &Path) -> Result<Option<String>>;
}

/// Runs the git binary as a subprocess
#[derive(Debug, Clone)]
pub struct GitClient {
    binary: String,
}

impl GitClient {
    /// Create a new Git client using the binary named in the configuration
    pub fn new(config: &Config) -> Self {
        Self::with_binary(config.git.binary.clone())
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run<I, S>(&self, action: &'static str, args: I, cwd: Option<&Path>) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = AsyncCommand::new(&self.binary);
        command.args(args);
        // Scopes the working directory to the child; our own cwd never moves
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        debug!("Running {} {} (cwd: {:?})", self.binary, action, cwd);

        let output = command
            .output()
            .await
            .map_err(|source| MirrorError::Spawn { action, source })?;

        if !output.status.success() {
            return Err(MirrorError::ExternalTool {
                action,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl GitRunner for GitClient {
    async fn clone_mirror(&self, url: &str, target: &Path) -> Result<()> {
        self.run(
            "clone",
            [OsStr::new("clone"), OsStr::new("--mirror"), OsStr::new(url), target.as_os_str()],
            None,
        )
        .await
        .map(|_| ())
    }

    async fn remote_update(&self, mirror_dir: &Path) -> Result<()> {
        self.run("remote update", ["remote", "update"], Some(mirror_dir))
            .await
            .map(|_| ())
    }

    async fn origin_url(&self, mirror_dir: &Path) -> Result<Option<String>> {
        // Pinned to the mirror's own config so an enclosing worktree is never consulted.
        // `git config --get` exits 1 when the key is missing.
        let args = [
            OsStr::new("--git-dir"),
            mirror_dir.as_os_str(),
            OsStr::new("config"),
            OsStr::new("--local"),
            OsStr::new("--get"),
            OsStr::new("remote.origin.url"),
        ];
        match self.run("config", args, Some(mirror_dir)).await {
            Ok(url) if url.is_empty() => Ok(None),
            Ok(url) => Ok(Some(url)),
            Err(MirrorError::ExternalTool { status, .. }) if status.code() == Some(1) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Compare two remote URLs, ignoring a trailing `.git`, trailing slashes and case
pub fn remote_urls_match(actual: &str, expected: &str) -> bool {
    let normalize = |url: &str| -> String {
        let url = url.trim().trim_end_matches('/');
        url.strip_suffix(".git").unwrap_or(url).to_lowercase()
    };

    normalize(actual) == normalize(expected)
}
