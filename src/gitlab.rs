//! GitLab starred-project listing over the REST v4 API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::env;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{MirrorError, Result};
use crate::starred::{StarredRepo, StarredSource};

const PLATFORM: &str = "GitLab";
const PER_PAGE: &str = "100";

/// GitLab user - fields we need from `/users?username=`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabUser {
    pub id: u64,
    pub username: String,
}

/// GitLab project - fields we need from `starred_projects`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabProject {
    /// Full path including namespace (e.g., "group/subgroup/project").
    pub path_with_namespace: String,
    /// HTTP clone URL.
    pub http_url_to_repo: Option<String>,
    /// Owning user; absent for group-owned projects.
    pub owner: Option<GitLabOwner>,
    pub namespace: Option<GitLabNamespace>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabOwner {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabNamespace {
    /// Namespace path (slug).
    pub path: String,
}

impl GitLabProject {
    fn owner_login(&self) -> Option<String> {
        self.owner
            .as_ref()
            .map(|o| o.username.clone())
            .or_else(|| self.namespace.as_ref().map(|n| n.path.clone()))
    }
}

/// GitLab API client for one instance.
pub struct GitLabClient {
    http: Client,
    api_base: String,
}

impl GitLabClient {
    /// Create a client for the configured host, with an optional token.
    pub fn new(config: &Config) -> Result<Self> {
        let token = env::var(&config.gitlab.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self::with_host(&config.gitlab.host, token.as_deref())
    }

    /// Create a client for `host` ("gitlab.com" or "https://gitlab.example.com").
    pub fn with_host(host: &str, token: Option<&str>) -> Result<Self> {
        let host = host.trim_end_matches('/');
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(token.trim())
                .map_err(|_| MirrorError::api(PLATFORM, "token contains invalid characters"))?;
            headers.insert("PRIVATE-TOKEN", value);
            debug!("Using GitLab token authentication");
        }

        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| MirrorError::api(PLATFORM, format!("failed to create client: {}", e)))?;

        Ok(Self {
            http,
            api_base: format!("{}/api/v4", host),
        })
    }

    async fn send(request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| MirrorError::api(PLATFORM, format!("{}: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MirrorError::api(
                PLATFORM,
                format!("{}: {} {}", what, status, body.trim()),
            ));
        }

        Ok(response)
    }

    /// Resolve a username to its user object.
    pub async fn find_user(&self, username: &str) -> Result<GitLabUser> {
        let what = format!("user lookup for {}", username);
        let response = Self::send(
            self.http
                .get(format!("{}/users", self.api_base))
                .query(&[("username", username)]),
            &what,
        )
        .await?;

        let users: Vec<GitLabUser> = response
            .json()
            .await
            .map_err(|e| MirrorError::api(PLATFORM, format!("{}: {}", what, e)))?;

        users
            .into_iter()
            .next()
            .ok_or_else(|| MirrorError::api(PLATFORM, format!("user not found: {}", username)))
    }

    /// All projects starred by a user, following `X-Next-Page`.
    pub async fn list_starred_projects(&self, user: &GitLabUser) -> Result<Vec<GitLabProject>> {
        let mut projects = Vec::new();
        let mut page = "1".to_string();

        loop {
            debug!("Fetching starred projects of {} page {}", user.username, page);
            let what = format!("starred projects of {} page {}", user.username, page);

            let response = Self::send(
                self.http
                    .get(format!("{}/users/{}/starred_projects", self.api_base, user.id))
                    .query(&[("per_page", PER_PAGE), ("page", page.as_str())]),
                &what,
            )
            .await?;

            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            let items: Vec<GitLabProject> = response
                .json()
                .await
                .map_err(|e| MirrorError::api(PLATFORM, format!("{}: {}", what, e)))?;

            let done = items.is_empty();
            projects.extend(items);

            match next_page {
                Some(next) if !done && next != page => page = next,
                _ => break,
            }
        }

        Ok(projects)
    }
}

#[async_trait]
impl StarredSource for GitLabClient {
    async fn starred(&self, username: &str) -> Result<Vec<StarredRepo>> {
        let user = self.find_user(username).await?;
        let projects = self.list_starred_projects(&user).await?;

        let repositories: Vec<StarredRepo> = projects
            .into_iter()
            .filter_map(|project| {
                let owner = project.owner_login();
                match project.http_url_to_repo {
                    Some(clone_url) => Some(StarredRepo { owner, clone_url }),
                    None => {
                        warn!(
                            "Starred project {} has no HTTP clone URL, skipping",
                            project.path_with_namespace
                        );
                        None
                    }
                }
            })
            .collect();

        info!("Found {} starred projects for {}", repositories.len(), username);
        Ok(repositories)
    }

    fn platform_name(&self) -> &'static str {
        PLATFORM
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn project(path: &str, owner: Option<&str>) -> serde_json::Value {
        let namespace = path.split('/').next().unwrap_or(path);
        let mut value = json!({
            "id": 1,
            "path_with_namespace": path,
            "http_url_to_repo": format!("https://gitlab.com/{}.git", path),
            "namespace": { "path": namespace },
        });
        if let Some(owner) = owner {
            value["owner"] = json!({ "username": owner });
        }
        value
    }

    async fn mount_user(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v4/users"))
            .and(query_param("username", "bob"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "id": 42, "username": "bob" }])),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_follows_next_page_header() {
        let server = MockServer::start().await;
        mount_user(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/v4/users/42/starred_projects"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-next-page", "2")
                    .set_body_json(json!([project("bob/notes", Some("bob"))])),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v4/users/42/starred_projects"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-next-page", "")
                    .set_body_json(json!([project("gnome/gtk", None)])),
            )
            .mount(&server)
            .await;

        let client = GitLabClient::with_host(&server.uri(), None).unwrap();
        let repos = client.starred("bob").await.unwrap();

        assert_eq!(
            repos,
            vec![
                StarredRepo::new("bob", "https://gitlab.com/bob/notes.git"),
                // group-owned projects fall back to their namespace
                StarredRepo::new("gnome", "https://gitlab.com/gnome/gtk.git"),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_user_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = GitLabClient::with_host(&server.uri(), None).unwrap();
        let result = client.starred("nobody").await;

        assert_matches!(
            result,
            Err(MirrorError::Api { platform: "GitLab", ref message }) if message.contains("nobody")
        );
    }

    #[tokio::test]
    async fn test_http_error_is_api_error() {
        let server = MockServer::start().await;
        mount_user(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v4/users/42/starred_projects"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = GitLabClient::with_host(&server.uri(), None).unwrap();
        assert_matches!(client.starred("bob").await, Err(MirrorError::Api { .. }));
    }

    #[tokio::test]
    async fn test_sends_private_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/users"))
            .and(header("PRIVATE-TOKEN", "glpat-secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "id": 7, "username": "carol" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GitLabClient::with_host(&server.uri(), Some("glpat-secret")).unwrap();
        let user = client.find_user("carol").await.unwrap();
        assert_eq!(user.id, 7);
    }

    #[test]
    fn test_host_without_scheme_gets_https() {
        let client = GitLabClient::with_host("gitlab.example.com/", None).unwrap();
        assert_eq!(client.api_base, "https://gitlab.example.com/api/v4");
    }
}
