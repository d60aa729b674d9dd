//! Single-repository mirror operation
//!
//! A [`Mirrorer`] owns the git runner and the path policy for one run and
//! decides, per URL, whether the mirror needs a fresh `clone --mirror` or a
//! `remote update`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{MirrorError, Result};
use crate::git::{remote_urls_match, GitRunner};
use crate::layout::Layout;

/// What a mirror operation did (or would have done in dry-run mode)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// A new mirror was cloned
    Cloned { path: PathBuf },
    /// An existing mirror was refreshed
    Updated { path: PathBuf },
    /// Dry run: the mirror does not exist yet
    WouldClone { path: PathBuf },
    /// Dry run: the mirror exists and would be refreshed
    WouldUpdate { path: PathBuf },
}

impl MirrorOutcome {
    pub fn path(&self) -> &Path {
        match self {
            MirrorOutcome::Cloned { path }
            | MirrorOutcome::Updated { path }
            | MirrorOutcome::WouldClone { path }
            | MirrorOutcome::WouldUpdate { path } => path,
        }
    }
}

/// Mirrors repositories below a base directory
pub struct Mirrorer<G> {
    git: G,
    base_dir: PathBuf,
    layout: Layout,
    dry_run: bool,
    /// Paths handed out during this run and the URL that claimed each one
    claimed: HashMap<PathBuf, String>,
}

impl<G: GitRunner> Mirrorer<G> {
    pub fn new(git: G, base_dir: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            git,
            base_dir: base_dir.into(),
            layout,
            dry_run: false,
            claimed: HashMap::new(),
        }
    }

    /// Build a mirrorer from the configured base directory and layout
    pub fn from_config(git: G, config: &Config) -> Self {
        Self::new(git, config.base_path(), config.layout)
    }

    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Where the mirror for `url` lives, without touching the filesystem
    pub fn target_path(&self, url: &str) -> Result<PathBuf> {
        Ok(self.base_dir.join(self.layout.map_url(url)?))
    }

    /// Make sure a current mirror of `url` exists on disk
    pub async fn mirror(&mut self, url: &str) -> Result<MirrorOutcome> {
        let url = url.trim();
        let path = self.target_path(url)?;
        self.claim(&path, url)?;

        info!("Backing up {} to {} ...", url, path.display());

        if path.exists() {
            // Dry runs never invoke git, so only in-run collisions are caught there
            if self.dry_run {
                info!("Would refresh {}", path.display());
                return Ok(MirrorOutcome::WouldUpdate { path });
            }

            self.ensure_same_origin(&path, url).await?;

            info!("Refreshing {} ...", path.display());
            self.git.remote_update(&path).await?;
            Ok(MirrorOutcome::Updated { path })
        } else {
            if self.dry_run {
                info!("Would clone {} into {}", url, path.display());
                return Ok(MirrorOutcome::WouldClone { path });
            }

            info!("Cloning {} ...", url);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| MirrorError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            self.git.clone_mirror(url, &path).await?;
            Ok(MirrorOutcome::Cloned { path })
        }
    }

    fn claim(&mut self, path: &Path, url: &str) -> Result<()> {
        match self.claimed.get(path) {
            Some(existing) if !remote_urls_match(existing, url) => Err(MirrorError::PathCollision {
                path: path.to_path_buf(),
                existing: existing.clone(),
                requested: url.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.claimed.insert(path.to_path_buf(), url.to_string());
                Ok(())
            }
        }
    }

    /// Refuse to refresh a mirror that was cloned from somewhere else
    async fn ensure_same_origin(&self, path: &Path, url: &str) -> Result<()> {
        match self.git.origin_url(path).await? {
            Some(origin) if !remote_urls_match(&origin, url) => Err(MirrorError::PathCollision {
                path: path.to_path_buf(),
                existing: origin,
                requested: url.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                debug!("No origin recorded in {}, assuming it matches", path.display());
                Ok(())
            }
        }
    }
}
