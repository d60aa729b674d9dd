use anyhow::{Context, Result};
use dirs::config_dir;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::layout::Layout;

const APP_NAME: &str = "backup-git";

/// Main configuration structure for backup-git
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory that mirror paths are resolved against
    #[serde(default = "default_base_directory")]
    pub base_directory: String,

    /// How mirror directories are laid out below the base directory
    #[serde(default)]
    pub layout: Layout,

    /// List file with one repository URL per line
    #[serde(default)]
    pub list: Option<String>,

    /// GitHub user whose starred repositories get mirrored
    #[serde(default)]
    pub gh_starred: Option<String>,

    /// GitLab user whose starred projects get mirrored
    #[serde(default)]
    pub gl_starred: Option<String>,

    /// GitHub API settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// GitLab API settings
    #[serde(default)]
    pub gitlab: GitLabConfig,

    /// External git tool settings
    #[serde(default)]
    pub git: GitConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    /// API base URL override (GitHub Enterprise)
    #[serde(default)]
    pub api_url: Option<String>,

    /// Environment variable holding an optional API token
    #[serde(default = "default_github_token_env")]
    pub token_env: String,
}

/// GitLab configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GitLabConfig {
    /// GitLab instance URL
    #[serde(default = "default_gitlab_host")]
    pub host: String,

    /// Environment variable holding an optional API token
    #[serde(default = "default_gitlab_token_env")]
    pub token_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitConfig {
    /// Name or path of the git executable
    #[serde(default = "default_git_binary")]
    pub binary: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"
}

// Default value functions
fn default_base_directory() -> String {
    ".".to_string()
}
fn default_github_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_gitlab_host() -> String {
    "https://gitlab.com".to_string()
}
fn default_gitlab_token_env() -> String {
    "GITLAB_TOKEN".to_string()
}
fn default_git_binary() -> String {
    "git".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            token_env: default_github_token_env(),
        }
    }
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            host: default_gitlab_host(),
            token_env: default_gitlab_token_env(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: default_git_binary(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Values given on the command line; `Some` overrides the config file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub list: Option<PathBuf>,
    pub gh_starred: Option<String>,
    pub gl_starred: Option<String>,
    pub base_directory: Option<PathBuf>,
    pub layout: Option<Layout>,
}

impl Config {
    /// Load the explicit config file, or the first default one that exists
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_config_paths().into_iter().find(|p| p.exists()) {
            Some(path) => {
                tracing::debug!("Using configuration file: {:?}", path);
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Candidate config files, most specific first
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = config_dir() {
            paths.push(dir.join(APP_NAME).join("config.yml"));
        }
        paths.push(PathBuf::from(format!("/etc/{}.yml", APP_NAME)));
        paths.push(PathBuf::from(format!("/usr/lib/{}/config.yml", APP_NAME)));
        paths
    }

    /// Expand environment variables and `~` in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.base_directory = shellexpand::full(&self.base_directory)
            .context("Failed to expand base_directory path")?
            .into_owned();

        if let Some(list) = &self.list {
            self.list = Some(
                shellexpand::full(list)
                    .context("Failed to expand list path")?
                    .into_owned(),
            );
        }

        Ok(())
    }

    /// Apply command-line values on top of the file configuration
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(list) = overrides.list {
            self.list = Some(list.to_string_lossy().into_owned());
        }
        if let Some(user) = overrides.gh_starred {
            self.gh_starred = Some(user);
        }
        if let Some(user) = overrides.gl_starred {
            self.gl_starred = Some(user);
        }
        if let Some(dir) = overrides.base_directory {
            self.base_directory = dir.to_string_lossy().into_owned();
        }
        if let Some(layout) = overrides.layout {
            self.layout = layout;
        }
    }

    pub fn base_path(&self) -> PathBuf {
        PathBuf::from(&self.base_directory)
    }

    /// Whether any batch has been requested
    pub fn has_work(&self) -> bool {
        self.list.is_some() || self.gh_starred.is_some() || self.gl_starred.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            layout: Layout::default(),
            list: None,
            gh_starred: None,
            gl_starred: None,
            github: GitHubConfig::default(),
            gitlab: GitLabConfig::default(),
            git: GitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
