//! GitHub contents API [`ContentRepository`] implementation.
//!
//! Objects are files in a single repository; the blob `sha` GitHub reports
//! for a file is its [`VersionToken`]. Creates omit `sha`, updates must send
//! the current one, and GitHub rejects a stale `sha` with 409 or 422.
//!
//! Files over 1 MB come back from the contents API with encoding `none` and
//! no inline content; their bytes are then read from the git blob named by
//! the same `sha`, so content and version always match.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::StatusCode;
use rosetta_core::VersionToken;
use serde::{Deserialize, Serialize};

use crate::config::GitHubConfig;
use crate::storage::repository::{ContentRepository, RemoteObject, RepositoryError};

/// `GET /repos/{owner}/{repo}/contents/{path}` response (file variant).
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

/// `PUT /repos/{owner}/{repo}/contents/{path}` request body.
#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// `PUT` response; only the new blob sha is of interest.
#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContentsFile,
}

#[derive(Debug, Deserialize)]
struct PutContentsFile {
    sha: String,
}

/// Durable backend on top of a GitHub repository.
pub struct GitHubRepository {
    http: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubRepository {
    /// Builds the HTTP client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: GitHubConfig, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http, config })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            path
        )
    }

    fn blob_url(&self, sha: &str) -> String {
        format!(
            "{}/repos/{}/{}/git/blobs/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            sha
        )
    }

    fn effective_ref<'a>(&'a self, git_ref: Option<&'a str>) -> Option<&'a str> {
        git_ref.or(Some(self.config.branch.as_str()).filter(|b| !b.is_empty()))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        self.authorize_as(request, "application/vnd.github+json")
    }

    fn authorize_as(
        &self,
        request: reqwest::RequestBuilder,
        accept: &'static str,
    ) -> reqwest::RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, accept);
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Raw bytes of the git blob `sha`.
    async fn fetch_blob(&self, path: &str, sha: &str) -> Result<Vec<u8>, RepositoryError> {
        let response = self
            .authorize_as(self.http.get(self.blob_url(sha)), "application/vnd.github.raw")
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, path, &body));
        }
        let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;
        Ok(bytes.to_vec())
    }
}

/// Maps a non-success status to the repository error taxonomy.
fn classify_status(status: StatusCode, path: &str, body: &str) -> RepositoryError {
    match status {
        StatusCode::NOT_FOUND => RepositoryError::NotFound {
            path: path.to_string(),
        },
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => RepositoryError::Conflict {
            path: path.to_string(),
        },
        _ => RepositoryError::Transient(format!("HTTP {} for {path}: {body}", status.as_u16())),
    }
}

fn transport_error(e: &reqwest::Error) -> RepositoryError {
    RepositoryError::Transient(e.to_string())
}

/// Where the bytes of a contents response live.
#[derive(Debug, PartialEq, Eq)]
enum ContentSource {
    Inline,
    /// Too large to inline; read the git blob with this sha.
    Blob,
}

fn content_source(response: &ContentsResponse) -> ContentSource {
    if response.encoding == "none" && response.content.is_empty() {
        ContentSource::Blob
    } else {
        ContentSource::Inline
    }
}

/// Decodes the base64 `content` field, which GitHub wraps at 60 columns.
fn decode_content(response: &ContentsResponse) -> Result<Vec<u8>, RepositoryError> {
    if !response.encoding.is_empty() && response.encoding != "base64" {
        return Err(RepositoryError::Decode(format!(
            "unsupported content encoding '{}'",
            response.encoding
        )));
    }
    let compact: String = response
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    BASE64
        .decode(compact)
        .map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[async_trait]
impl ContentRepository for GitHubRepository {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn fetch(
        &self,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<RemoteObject, RepositoryError> {
        let mut request = self.authorize(self.http.get(self.contents_url(path)));
        if let Some(git_ref) = self.effective_ref(git_ref) {
            request = request.query(&[("ref", git_ref)]);
        }

        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, path, &body));
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let bytes = match content_source(&contents) {
            ContentSource::Inline => decode_content(&contents)?,
            ContentSource::Blob => self.fetch_blob(path, &contents.sha).await?,
        };
        Ok(RemoteObject {
            bytes,
            version: VersionToken::new(contents.sha),
        })
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        expected: Option<&VersionToken>,
        git_ref: Option<&str>,
    ) -> Result<VersionToken, RepositoryError> {
        let body = PutContentsRequest {
            message,
            content: BASE64.encode(bytes),
            sha: expected.map(VersionToken::as_str),
            branch: self.effective_ref(git_ref),
        };

        let response = self
            .authorize(self.http.put(self.contents_url(path)))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, path, &body));
        }

        let written: PutContentsResponse = response
            .json()
            .await
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        Ok(VersionToken::new(written.content.sha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> GitHubRepository {
        let config = GitHubConfig {
            owner: "phetsims".to_string(),
            repo: "babel".to_string(),
            branch: "main".to_string(),
            api_base_url: "https://api.github.com/".to_string(),
            token: None,
            user_agent: "rosetta-test".to_string(),
        };
        GitHubRepository::new(config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn contents_url_joins_segments() {
        assert_eq!(
            repo().contents_url("sim1/sim1-strings_es.json"),
            "https://api.github.com/repos/phetsims/babel/contents/sim1/sim1-strings_es.json"
        );
    }

    #[test]
    fn explicit_ref_overrides_branch() {
        let repo = repo();
        assert_eq!(repo.effective_ref(None), Some("main"));
        assert_eq!(repo.effective_ref(Some("abc123")), Some("abc123"));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "p", ""),
            RepositoryError::NotFound { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::CONFLICT, "p", ""),
            RepositoryError::Conflict { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, "p", ""),
            RepositoryError::Conflict { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "p", "upstream"),
            RepositoryError::Transient(msg) if msg.contains("502")
        ));
    }

    #[test]
    fn decodes_wrapped_base64() {
        let response = ContentsResponse {
            sha: "abc".to_string(),
            content: "eyJrIjp7InZhbHVlIjoi\ndiJ9fQ==\n".to_string(),
            encoding: "base64".to_string(),
        };
        assert_eq!(decode_content(&response).unwrap(), br#"{"k":{"value":"v"}}"#);
    }

    #[test]
    fn rejects_unknown_encoding() {
        let response = ContentsResponse {
            sha: "abc".to_string(),
            content: "xyz".to_string(),
            encoding: "utf-16".to_string(),
        };
        assert_eq!(content_source(&response), ContentSource::Inline);
        assert!(matches!(decode_content(&response), Err(RepositoryError::Decode(_))));
    }

    #[test]
    fn large_file_is_read_from_blob() {
        let response: ContentsResponse = serde_json::from_value(serde_json::json!({
            "type": "file",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
            "size": 2_000_000,
            "content": "",
            "encoding": "none"
        }))
        .unwrap();
        assert_eq!(content_source(&response), ContentSource::Blob);
        assert_eq!(
            repo().blob_url(&response.sha),
            format!("https://api.github.com/repos/phetsims/babel/git/blobs/{}", response.sha)
        );
    }

    #[test]
    fn small_file_is_inline() {
        let response = ContentsResponse {
            sha: "abc".to_string(),
            content: "e30=".to_string(),
            encoding: "base64".to_string(),
        };
        assert_eq!(content_source(&response), ContentSource::Inline);
    }

    #[test]
    fn put_body_omits_sha_on_create() {
        let body = PutContentsRequest {
            message: "m",
            content: BASE64.encode(b"{}"),
            sha: None,
            branch: Some("main"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());
        assert_eq!(json["content"], "e30=");
        assert_eq!(json["branch"], "main");
    }
}
