//! Tag helper for the GitHub REST API
//!
//! Lists repository tags and pushes a new tag, optionally backed by an
//! annotated tag object. The client is constructed explicitly by the caller
//! and passed where needed.

use crate::core::error::PublishError;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "app-repo-publisher";
const TAGS_PER_PAGE: u32 = 100;

/// Entry of `GET /repos/{owner}/{repo}/tags`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoTag {
    pub name: String,
    pub commit: TagCommit,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagCommit {
    pub sha: String,
}

#[derive(Debug, Serialize)]
struct NewTagObject<'a> {
    tag: &'a str,
    message: &'a str,
    object: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Serialize)]
struct NewRef<'a> {
    #[serde(rename = "ref")]
    reference: String,
    sha: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    sha: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
}

/// Client for one `owner/name` repository
pub struct GitHubTagClient {
    client: reqwest::Client,
    api_url: String,
    repository: String,
    token: SecretString,
}

impl GitHubTagClient {
    /// `repository` is `owner/name`, as in `GITHUB_REPOSITORY`
    pub fn new(
        token: SecretString,
        repository: &str,
        api_url: &str,
    ) -> Result<Self, PublishError> {
        if repository.split('/').filter(|part| !part.is_empty()).count() != 2 {
            return Err(PublishError::IncorrectConfiguration);
        }

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
            token,
        })
    }

    /// First page (up to 100) of repository tags
    pub async fn list_tags(&self) -> Result<Vec<RepoTag>, PublishError> {
        let url = format!(
            "{}/repos/{}/tags?per_page={}",
            self.api_url, self.repository, TAGS_PER_PAGE
        );
        debug!(%url, "listing tags");
        let response = self.authorized(self.client.get(&url)).send().await?;
        Self::read_json(response).await
    }

    /// Create `refs/tags/<tag>` pointing at `sha`
    ///
    /// With `annotated`, an annotated tag object is created first and the
    /// ref points at that object instead of the commit.
    pub async fn create_tag(
        &self,
        tag: &str,
        annotated: bool,
        sha: &str,
    ) -> Result<(), PublishError> {
        let target = if annotated {
            debug!(tag, "creating annotated tag");
            let object: CreatedObject = self
                .post_json(
                    "git/tags",
                    &NewTagObject {
                        tag,
                        message: tag,
                        object: sha,
                        kind: "commit",
                    },
                )
                .await?;
            object.sha
        } else {
            sha.to_string()
        };

        debug!(tag, "pushing new tag to the repo");
        let _: serde_json::Value = self
            .post_json(
                "git/refs",
                &NewRef {
                    reference: format!("refs/tags/{}", tag),
                    sha: &target,
                },
            )
            .await?;

        Ok(())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header(ACCEPT, "application/vnd.github+json")
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PublishError> {
        let url = format!("{}/repos/{}/{}", self.api_url, self.repository, path);
        let response = self
            .authorized(self.client.post(&url))
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PublishError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error: ApiError = serde_json::from_str(&body).unwrap_or_default();
            let message = error
                .message
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            return Err(PublishError::Remote {
                status: Some(status.as_u16()),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
