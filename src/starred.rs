//! Starred-repository sources
//!
//! This module provides a platform-agnostic interface for listing the
//! repositories a user has starred, and the batch that mirrors them.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::batch::BatchSummary;
use crate::error::Result;
use crate::git::GitRunner;
use crate::mirror::Mirrorer;

/// A starred repository as reported by a hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarredRepo {
    /// Login of the owning user or namespace, if the platform reports one
    pub owner: Option<String>,
    /// HTTP(S) clone URL
    pub clone_url: String,
}

impl StarredRepo {
    pub fn new(owner: impl Into<String>, clone_url: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            clone_url: clone_url.into(),
        }
    }

    /// Whether `username` owns this repository
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner.as_deref() == Some(username)
    }
}

/// Lists a user's starred repositories on one platform
///
/// Implementations fetch every page before returning.
#[async_trait]
pub trait StarredSource: Send + Sync {
    /// All repositories starred by `username`
    async fn starred(&self, username: &str) -> Result<Vec<StarredRepo>>;

    /// Platform name for display/logging
    fn platform_name(&self) -> &'static str;
}

/// Mirror everything `username` starred on one platform, except their own repositories
pub async fn mirror_starred<G, S>(
    mirrorer: &mut Mirrorer<G>,
    source: &S,
    username: &str,
) -> BatchSummary
where
    G: GitRunner,
    S: StarredSource + ?Sized,
{
    let platform = source.platform_name();
    info!("Backing up {} repositories starred by {} ...", platform, username);

    let mut summary = BatchSummary::new(format!("{} stars of {}", platform, username));

    let repos = match source.starred(username).await {
        Ok(repos) => repos,
        Err(e) => {
            summary.abort(&e);
            return summary;
        }
    };

    info!("Found {} starred repositories", repos.len());

    for repo in repos {
        if repo.is_owned_by(username) {
            debug!("Skipping own repository {}", repo.clone_url);
            summary.skipped += 1;
            continue;
        }

        let result = mirrorer.mirror(&repo.clone_url).await;
        summary.record(&repo.clone_url, result);
    }

    summary.log();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_check() {
        let repo = StarredRepo::new("octocat", "https://github.com/octocat/Hello-World.git");
        assert!(repo.is_owned_by("octocat"));
        assert!(!repo.is_owned_by("someone-else"));

        let ownerless = StarredRepo {
            owner: None,
            clone_url: "https://gitlab.com/group/project.git".to_string(),
        };
        assert!(!ownerless.is_owned_by("octocat"));
    }
}
