//! Publishing a finished node list to a GitHub repository.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use xrpl_peers_connection::default_user_agent;

/// Public GitHub REST API.
pub const GITHUB_API: &str = "https://api.github.com";
/// Commit message used for node list updates.
pub const COMMIT_MESSAGE: &str = "Weekly auto update";

/// Errors that can occur while publishing.
#[derive(Debug)]
pub enum PublishError {
    /// The node list could not be read.
    Io(io::Error),
    /// The request to the remote store failed.
    Request(reqwest::Error),
    /// The remote store rejected the request.
    Status(reqwest::StatusCode, String),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Io(err) => write!(f, "Failed to read node list: {err}"),
            PublishError::Request(err) => write!(f, "Publish request failed: {err}"),
            PublishError::Status(status, body) => {
                write!(f, "Publish rejected with status {status}: {body}")
            }
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PublishError::Io(err) => Some(err),
            PublishError::Request(err) => Some(err),
            PublishError::Status(..) => None,
        }
    }
}

impl From<io::Error> for PublishError {
    fn from(err: io::Error) -> Self {
        PublishError::Io(err)
    }
}

impl From<reqwest::Error> for PublishError {
    fn from(err: reqwest::Error) -> Self {
        PublishError::Request(err)
    }
}

/// Pushes a finished node list to a remote versioned store.
///
/// Only called once the node list file has been flushed and closed.
pub trait Publisher: Send + Sync {
    fn publish(
        &self,
        node_list: &Path,
    ) -> impl std::future::Future<Output = Result<(), PublishError>> + Send;
}

/// Target of [`GitHubPublisher`].
#[derive(Clone, PartialEq, Eq)]
pub struct GitHubSettings {
    pub token: String,
    pub owner: String,
    pub repository: String,
    /// Directory inside the repository, may be empty.
    pub directory: String,
    pub branch: String,
}

// Keep the token out of logs.
impl fmt::Debug for GitHubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubSettings")
            .field("owner", &self.owner)
            .field("repository", &self.repository)
            .field("directory", &self.directory)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

impl GitHubSettings {
    /// Path of `file_name` inside the repository.
    pub fn remote_path(&self, file_name: &str) -> String {
        let directory = self.directory.trim_matches('/');
        if directory.is_empty() {
            file_name.to_string()
        } else {
            format!("{directory}/{file_name}")
        }
    }
}

#[derive(Deserialize)]
struct ContentResponse {
    sha: String,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

/// Updates a file through the GitHub contents API.
#[derive(Debug, Clone)]
pub struct GitHubPublisher {
    client: reqwest::Client,
    settings: GitHubSettings,
    api_base: String,
}

impl GitHubPublisher {
    pub fn new(settings: GitHubSettings) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .user_agent(default_user_agent())
            .build()?;
        Ok(Self {
            client,
            settings,
            api_base: GITHUB_API.to_string(),
        })
    }

    /// Point the publisher at another GitHub compatible API.
    pub fn with_api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn contents_url(&self, remote_path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.settings.owner, self.settings.repository, remote_path
        )
    }

    /// Blob sha of the current file, `None` if it does not exist yet.
    async fn current_sha(&self, url: &str) -> Result<Option<String>, PublishError> {
        let response = self
            .client
            .get(url)
            .query(&[("ref", self.settings.branch.as_str())])
            .bearer_auth(&self.settings.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Status(status, body));
        }

        let content: ContentResponse = response.json().await?;
        Ok(Some(content.sha))
    }
}

impl Publisher for GitHubPublisher {
    async fn publish(&self, node_list: &Path) -> Result<(), PublishError> {
        let data = tokio::fs::read(node_list).await?;
        let file_name = node_list
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let remote_path = self.settings.remote_path(&file_name);
        let url = self.contents_url(&remote_path);

        let sha = self.current_sha(&url).await?;
        let request = UpdateRequest {
            message: COMMIT_MESSAGE,
            content: BASE64.encode(&data),
            branch: &self.settings.branch,
            sha,
        };

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.settings.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Status(status, body));
        }

        info!(
            "Published {} to {}/{} ({})",
            remote_path, self.settings.owner, self.settings.repository, self.settings.branch
        );
        Ok(())
    }
}
