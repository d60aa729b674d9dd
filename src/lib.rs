//! backup-git - mirror remote git repositories to local disk
//!
//! Keeps bare `git clone --mirror` copies of every repository named in a list
//! file, or starred by a user on GitHub or GitLab, and refreshes mirrors that
//! already exist with `git remote update`.
//!
//! ## Modules
//!
//! - [`layout`]: URL to mirror-path mapping (`preserve` / `flatten`)
//! - [`mirror`]: the clone-or-update decision for one repository
//! - [`batch`]: list-file processing and status aggregation
//! - [`starred`]: starred-repository batches, backed by [`github`] and [`gitlab`]
//! - [`config`]: YAML configuration with XDG lookup

pub mod batch;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod gitlab;
pub mod layout;
pub mod mirror;
pub mod starred;

pub use batch::{mirror_list, BatchStatus, BatchSummary};
pub use config::Config;
pub use error::MirrorError;
pub use git::{GitClient, GitRunner};
pub use github::GitHubClient;
pub use gitlab::GitLabClient;
pub use layout::Layout;
pub use mirror::{MirrorOutcome, Mirrorer};
pub use starred::{mirror_starred, StarredRepo, StarredSource};
