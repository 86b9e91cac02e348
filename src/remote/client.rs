//! HTTP client for the application repository API
//!
//! All requests carry Basic authentication and `Accept: application/json`.
//! Non-2xx responses are turned into `PublishError::Remote` through the
//! status table in `error_translation`.

use crate::core::error::PublishError;
use crate::core::job::RemoteJob;
use crate::core::traits::{AppRepository, ScopedVersion};
use crate::remote::error_translation::translate;
use crate::security::credentials::SecureCredentials;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

const USER_AGENT: &str = "sncicd_extint_github";
const PUBLISH_PATH: &str = "/api/sn_cicd/app_repo/publish";
const INSTALL_PATH: &str = "/api/sn_cicd/app_repo/install";
const APP_TABLE_PATH: &str = "/api/now/table/sys_app";

/// `{ "result": ... }` wrapper used by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct AppVersionRecord {
    #[serde(default)]
    version: Option<String>,
}

/// reqwest implementation of `AppRepository`
pub struct AppRepoClient {
    client: reqwest::Client,
    base_url: String,
    credentials: SecureCredentials,
}

impl AppRepoClient {
    /// Create a client for `base_url` (e.g. `https://acme.service-now.com`)
    pub fn new(base_url: &str, credentials: SecureCredentials) -> Result<Self, PublishError> {
        if !credentials.is_complete() {
            return Err(PublishError::IncorrectConfiguration);
        }

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(
                self.credentials.username(),
                Some(self.credentials.password().expose_secret()),
            )
            .header(ACCEPT, "application/json")
    }

    async fn get_result<T: DeserializeOwned>(&self, url: &str) -> Result<T, PublishError> {
        debug!(%url, "GET");
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::read_result(response).await
    }

    async fn post_result<T: DeserializeOwned>(&self, url: &str) -> Result<T, PublishError> {
        debug!(%url, "POST");
        let response = self
            .authorized(self.client.post(url))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::read_result(response).await
    }

    /// Transport failure with the password scrubbed from the message
    fn transport_error(&self, error: reqwest::Error) -> PublishError {
        PublishError::Transport {
            message: self.credentials.redact(&error.to_string()),
        }
    }

    async fn read_result<T: DeserializeOwned>(response: Response) -> Result<T, PublishError> {
        let status = response.status();

        if !status.is_success() {
            let fallback = format!("Request failed with status code {}", status.as_u16());
            let body = response.text().await.unwrap_or_default();
            return Err(translate(status.as_u16(), &body, &fallback));
        }

        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.result)
    }
}

#[async_trait]
impl AppRepository for AppRepoClient {
    async fn app_version(&self, sys_id: &str) -> Result<Option<String>, PublishError> {
        let url = format!(
            "{}{}/{}?sysparm_fields=version",
            self.base_url, APP_TABLE_PATH, sys_id
        );
        let record: AppVersionRecord = self.get_result(&url).await?;
        Ok(record.version.filter(|v| !v.is_empty()))
    }

    async fn scoped_versions(&self) -> Result<Vec<ScopedVersion>, PublishError> {
        let url = format!(
            "{}{}?sysparm_fields=scope,version",
            self.base_url, APP_TABLE_PATH
        );
        self.get_result(&url).await
    }

    async fn publish(&self, query: &str) -> Result<RemoteJob, PublishError> {
        let url = format!("{}{}?{}", self.base_url, PUBLISH_PATH, query);
        self.post_result(&url).await
    }

    async fn install(&self, query: &str) -> Result<RemoteJob, PublishError> {
        let url = format!("{}{}?{}", self.base_url, INSTALL_PATH, query);
        self.post_result(&url).await
    }

    async fn progress(&self, url: &str) -> Result<RemoteJob, PublishError> {
        self.get_result(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job::JobStatus;
    use mockito::{Matcher, Server};

    fn credentials() -> SecureCredentials {
        SecureCredentials::new("admin", "secret")
    }

    const JOB_BODY: &str = r#"{
        "result": {
            "links": {"progress": {"id": "p1", "url": "http://localhost/progress/p1"}},
            "status": "0",
            "status_label": "Pending",
            "status_message": "",
            "status_detail": "",
            "error": "",
            "percent_complete": 0
        }
    }"#;

    #[tokio::test]
    async fn test_app_version_sends_auth_and_accept_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/now/table/sys_app/abc")
            .match_query(Matcher::UrlEncoded(
                "sysparm_fields".to_string(),
                "version".to_string(),
            ))
            // base64("admin:secret")
            .match_header("authorization", "Basic YWRtaW46c2VjcmV0")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result": {"version": "1.1.1"}}"#)
            .create_async()
            .await;

        let client = AppRepoClient::new(&server.url(), credentials()).unwrap();
        let version = client.app_version("abc").await.unwrap();

        mock.assert_async().await;
        assert_eq!(version.as_deref(), Some("1.1.1"));
    }

    #[test]
    fn test_incomplete_credentials_are_rejected() {
        let result = AppRepoClient::new(
            "https://acme.service-now.com",
            SecureCredentials::new("admin", ""),
        );
        assert!(matches!(result, Err(PublishError::IncorrectConfiguration)));
    }

    #[tokio::test]
    async fn test_unreachable_instance_is_a_transport_error() {
        let client = AppRepoClient::new("http://127.0.0.1:1", credentials()).unwrap();
        let error = client.app_version("abc").await.unwrap_err();

        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn test_app_version_without_version_is_absent() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/now/table/sys_app/abc")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result": {"version": ""}}"#)
            .create_async()
            .await;

        let client = AppRepoClient::new(&server.url(), credentials()).unwrap();
        assert_eq!(client.app_version("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_not_found_uses_fixed_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/now/table/sys_app/missing")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"result": {"error": "No Record found"}}"#)
            .create_async()
            .await;

        let client = AppRepoClient::new(&server.url(), credentials()).unwrap();
        let error = client.app_version("missing").await.unwrap_err();

        assert_eq!(
            error.to_string(),
            "Not found. The requested item was not found."
        );
    }

    #[tokio::test]
    async fn test_scoped_versions_lists_rows() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/now/table/sys_app")
            .match_query(Matcher::UrlEncoded(
                "sysparm_fields".to_string(),
                "scope,version".to_string(),
            ))
            .with_status(200)
            .with_body(
                r#"{"result": [
                    {"scope": "x_one", "version": "1.0.0"},
                    {"scope": "x_two", "version": "2.3.4"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = AppRepoClient::new(&server.url(), credentials()).unwrap();
        let rows = client.scoped_versions().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].scope, "x_two");
        assert_eq!(rows[1].version, "2.3.4");
    }

    #[tokio::test]
    async fn test_publish_posts_query_and_parses_job() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/sn_cicd/app_repo/publish")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("sys_id".to_string(), "abc".to_string()),
                Matcher::UrlEncoded("version".to_string(), "1.2.3".to_string()),
            ]))
            .with_status(200)
            .with_body(JOB_BODY)
            .create_async()
            .await;

        let client = AppRepoClient::new(&server.url(), credentials()).unwrap();
        let job = client.publish("sys_id=abc&version=1.2.3").await.unwrap();

        mock.assert_async().await;
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.id(), "p1");
    }

    #[tokio::test]
    async fn test_install_posts_to_install_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/sn_cicd/app_repo/install")
            .match_query(Matcher::UrlEncoded(
                "app_sys_id".to_string(),
                "abc".to_string(),
            ))
            .with_status(200)
            .with_body(JOB_BODY)
            .create_async()
            .await;

        let client = AppRepoClient::new(&server.url(), credentials()).unwrap();
        client.install("app_sys_id=abc").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_status_uses_body_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/sn_cicd/app_repo/publish")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(
                r#"{"result": {"error": "Version already exists", "status_message": "Failed"}}"#,
            )
            .create_async()
            .await;

        let client = AppRepoClient::new(&server.url(), credentials()).unwrap();
        let error = client.publish("scope=x_app&version=1.0.0").await.unwrap_err();

        assert_eq!(error.to_string(), "Version already exists");
    }

    #[tokio::test]
    async fn test_unknown_status_without_body_uses_transport_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/progress/p1")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let client = AppRepoClient::new(&server.url(), credentials()).unwrap();
        let url = format!("{}/progress/p1", server.url());
        let error = client.progress(&url).await.unwrap_err();

        assert_eq!(error.to_string(), "Request failed with status code 502");
    }

    #[tokio::test]
    async fn test_progress_fetches_absolute_url() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/progress/p1")
            .with_status(200)
            .with_body(
                r#"{"result": {
                    "status": "2",
                    "status_label": "Successful",
                    "percent_complete": 100
                }}"#,
            )
            .create_async()
            .await;

        let client = AppRepoClient::new(&server.url(), credentials()).unwrap();
        let url = format!("{}/progress/p1", server.url());
        let job = client.progress(&url).await.unwrap();

        assert_eq!(job.status, JobStatus::Successful);
        assert_eq!(job.percent_complete, 100);
    }
}
