use async_trait::async_trait;
use octocrab::{Octocrab, Page};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{MirrorError, Result};
use crate::starred::{StarredRepo, StarredSource};

const PLATFORM: &str = "GitHub";

/// GitHub client wrapper for listing starred repositories
pub struct GitHubClient {
    client: Octocrab,
}

/// The fields of a starred repository we actually use
#[derive(Debug, Deserialize)]
struct GitHubStarredRepo {
    full_name: Option<String>,
    owner: Option<GitHubOwner>,
    clone_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubOwner {
    login: String,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
}

impl GitHubClient {
    /// Create a new GitHub client, authenticated only if a token is available
    pub fn new(config: &Config) -> Result<Self> {
        let token = Self::try_environment_token(&config.github.token_env);
        if token.is_some() {
            info!("Using GitHub token from {}", config.github.token_env);
        } else {
            info!("Using anonymous GitHub access");
        }

        let mut builder = Octocrab::builder();
        if let Some(api_url) = &config.github.api_url {
            builder = builder
                .base_uri(api_url.as_str())
                .map_err(|e| MirrorError::api(PLATFORM, format!("invalid api_url {}: {}", api_url, e)))?;
        }
        if let Some(token) = token {
            builder = builder.personal_token(token);
        }

        let client = builder
            .build()
            .map_err(|e| MirrorError::api(PLATFORM, format!("failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Try to get token from environment variable
    fn try_environment_token(var: &str) -> Option<String> {
        match env::var(var) {
            Ok(token) if !token.trim().is_empty() => {
                debug!("Found {} environment variable", var);
                Some(token.trim().to_string())
            }
            Ok(_) => {
                warn!("{} is set but empty, using anonymous access", var);
                None
            }
            Err(_) => None,
        }
    }

    /// List every repository starred by `username`, following pagination
    pub async fn list_starred_repositories(&self, username: &str) -> Result<Vec<StarredRepo>> {
        debug!("Fetching starred repositories for: {}", username);

        let route = format!("/users/{}/starred", username);
        let first_page: Page<GitHubStarredRepo> = self
            .client
            .get(&route, Some(&PageParams { per_page: 100 }))
            .await
            .map_err(|e| {
                MirrorError::api(PLATFORM, format!("failed to list stars of {}: {}", username, e))
            })?;

        let items = self.client.all_pages(first_page).await.map_err(|e| {
            MirrorError::api(PLATFORM, format!("failed to page stars of {}: {}", username, e))
        })?;

        let repositories: Vec<StarredRepo> = items
            .into_iter()
            .filter_map(|repo| match repo.clone_url {
                Some(clone_url) => Some(StarredRepo {
                    owner: repo.owner.map(|o| o.login),
                    clone_url,
                }),
                None => {
                    warn!(
                        "Starred repository {} has no clone URL, skipping",
                        repo.full_name.as_deref().unwrap_or("<unknown>")
                    );
                    None
                }
            })
            .collect();

        info!("Found {} starred repositories for {}", repositories.len(), username);
        Ok(repositories)
    }
}

#[async_trait]
impl StarredSource for GitHubClient {
    async fn starred(&self, username: &str) -> Result<Vec<StarredRepo>> {
        self.list_starred_repositories(username).await
    }

    fn platform_name(&self) -> &'static str {
        PLATFORM
    }
}
