//! URL to mirror-path mapping
//!
//! Turns a repository URL into a relative directory path for its mirror.
//! Every component of the URL after the scheme is validated so that no
//! URL can escape the base directory.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{MirrorError, Result};

/// Suffix carried by every mirror directory
pub const MIRROR_SUFFIX: &str = ".git";

/// How mirror directories are laid out below the base directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `https://host/org/repo` -> `host/org/repo.git`
    #[default]
    Preserve,
    /// `https://host/org/repo` -> `repo.git`
    Flatten,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Preserve => f.write_str("preserve"),
            Layout::Flatten => f.write_str("flatten"),
        }
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "preserve" => Ok(Layout::Preserve),
            "flatten" => Ok(Layout::Flatten),
            other => Err(format!("unknown layout: {} (expected preserve or flatten)", other)),
        }
    }
}

impl Layout {
    /// Map a repository URL to the relative path of its mirror
    pub fn map_url(self, url: &str) -> Result<PathBuf> {
        let mut components = validated_components(url)?;

        if self == Layout::Flatten {
            if let Some(basename) = components.pop() {
                components = vec![basename];
            }
        }

        if let Some(last) = components.last_mut() {
            if !last.ends_with(MIRROR_SUFFIX) {
                last.push_str(MIRROR_SUFFIX);
            }
        }

        Ok(PathBuf::from(components.join("/")))
    }
}

/// Map a URL using the default `preserve` layout
pub fn map_url(url: &str) -> Result<PathBuf> {
    Layout::Preserve.map_url(url)
}

fn validated_components(url: &str) -> Result<Vec<String>> {
    let url = url.trim();
    if url.is_empty() {
        return Err(MirrorError::invalid_url(url, "empty URL"));
    }

    let rest = match url.find("//") {
        Some(pos) => &url[pos + 2..],
        None => return Err(MirrorError::invalid_url(url, "URL has no '//' separator")),
    };
    if rest.is_empty() {
        return Err(MirrorError::invalid_url(url, "URL has nothing after '//'"));
    }

    let components: Vec<&str> = rest.split('/').collect();
    for component in &components {
        match *component {
            "" => return Err(MirrorError::invalid_url(url, "URL contains an empty component")),
            "." => return Err(MirrorError::invalid_url(url, "URL contains a '.' component")),
            ".." => return Err(MirrorError::invalid_url(url, "URL contains a '..' component")),
            _ => {}
        }
    }

    Ok(components.into_iter().map(str::to_string).collect())
}
