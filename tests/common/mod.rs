//! Common test utilities and helpers for backup-git tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use backup_git::error::Result;
use backup_git::{MirrorError, StarredRepo, StarredSource};

/// A git action the fake runner was asked to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    Clone { url: String, target: PathBuf },
    Update { dir: PathBuf },
}

/// Records git invocations instead of running git
///
/// Clones create the target directory so that a second run sees an
/// existing mirror, the same as real git would leave behind.
#[derive(Clone, Default)]
pub struct RecordingGit {
    calls: Arc<Mutex<Vec<GitCall>>>,
    failing: Arc<Vec<String>>,
}

impl RecordingGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clones of URLs containing any of `needles` fail like a non-zero git exit
    pub fn failing_on(needles: &[&str]) -> Self {
        Self {
            calls: Arc::default(),
            failing: Arc::new(needles.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clone_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GitCall::Clone { .. }))
            .count()
    }
}

#[async_trait]
impl backup_git::GitRunner for RecordingGit {
    async fn clone_mirror(&self, url: &str, target: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(GitCall::Clone {
            url: url.to_string(),
            target: target.to_path_buf(),
        });

        if self.failing.iter().any(|needle| url.contains(needle.as_str())) {
            return Err(MirrorError::Spawn {
                action: "clone",
                source: std::io::Error::new(std::io::ErrorKind::Other, "simulated git failure"),
            });
        }

        std::fs::create_dir_all(target).expect("Failed to create fake mirror");
        Ok(())
    }

    async fn remote_update(&self, mirror_dir: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(GitCall::Update {
            dir: mirror_dir.to_path_buf(),
        });
        Ok(())
    }

    async fn origin_url(&self, _mirror_dir: &Path) -> Result<Option<String>> {
        Ok(None)
    }
}

/// A fixed set of starred repositories
pub struct FakeStarred {
    pub repos: Vec<StarredRepo>,
}

#[async_trait]
impl StarredSource for FakeStarred {
    async fn starred(&self, _username: &str) -> Result<Vec<StarredRepo>> {
        Ok(self.repos.clone())
    }

    fn platform_name(&self) -> &'static str {
        "Fake"
    }
}

/// A starred source whose API is down
pub struct UnreachableStarred;

#[async_trait]
impl StarredSource for UnreachableStarred {
    async fn starred(&self, username: &str) -> Result<Vec<StarredRepo>> {
        Err(MirrorError::Api {
            platform: "Fake",
            message: format!("connection refused while listing {}", username),
        })
    }

    fn platform_name(&self) -> &'static str {
        "Fake"
    }
}

/// Temporary workspace with a mirror directory and list files
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub mirror_dir: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mirror_dir = temp_dir.path().join("mirrors");

        Self {
            temp_dir,
            mirror_dir,
        }
    }

    pub fn write_list(&self, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join("repos.lst");
        std::fs::write(&path, content).expect("Failed to write list file");
        path
    }

    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join("config.yml");
        std::fs::write(&path, content).expect("Failed to write test config");
        path
    }
}
