//! Error types for mirror operations.
//!
//! Everything except [`MirrorError::ListFile`] is a per-item failure: batches
//! log it, mark themselves failed and move on to the next repository.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised while mapping, cloning, or refreshing a repository.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Invalid repository URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: &'static str },

    #[error("git {action} failed ({status}): {stderr}")]
    ExternalTool {
        action: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Failed to run git {action}: {source}")]
    Spawn {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{platform} API error: {message}")]
    Api {
        platform: &'static str,
        message: String,
    },

    #[error("Path {path:?} already belongs to {existing}, refusing to reuse it for {requested}")]
    PathCollision {
        path: PathBuf,
        existing: String,
        requested: String,
    },

    #[error("Failed to read list file {path:?}: {source}")]
    ListFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MirrorError {
    pub(crate) fn invalid_url(url: &str, reason: &'static str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason,
        }
    }

    pub(crate) fn api(platform: &'static str, message: impl Into<String>) -> Self {
        Self::Api {
            platform,
            message: message.into(),
        }
    }
}

pub type Result<T, E = MirrorError> = std::result::Result<T, E>;
