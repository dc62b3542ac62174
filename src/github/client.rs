use super::types::{BodyFailurePolicy, ContentEntry, PostsLocation, RepoEntry};
use crate::blog::ArticleSource;
use futures::future::{join_all, try_join_all};
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub(crate) const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB
const USER_AGENT: &str = concat!("folio/", env!("CARGO_PKG_VERSION"));
const REPOS_PER_PAGE: &str = "100";

/// Errors from the content host.
///
/// Every variant is a transport failure from the caller's point of view:
/// there is no partial catalog and no retry.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    /// Response body did not match the endpoint's expected JSON shape
    #[error("Unexpected response shape: {0}")]
    Schema(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// HTTP client for the contents and repository-listing endpoints.
///
/// The bearer credential is only attached to API calls; raw file downloads go
/// to a different host and are always anonymous.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: Url,
    token: Option<SecretString>,
    timeout: Duration,
}

impl GitHubClient {
    pub fn new(
        api_base: &str,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Self::with_http(http, api_base, token, timeout)
    }

    pub fn with_http(
        http: reqwest::Client,
        api_base: &str,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let api_base = parse_http_url(api_base)?;
        Ok(Self {
            http,
            api_base,
            token,
            timeout,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// `GET /repos/{owner}/{repo}/contents/{path}`
    pub async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>, FetchError> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let url = self.api_url(&segments, &[])?;
        self.get_api_json(url).await
    }

    /// `GET /users/{username}/repos?sort=updated&per_page=100`
    pub async fn list_user_repos(&self, username: &str) -> Result<Vec<RepoEntry>, FetchError> {
        let url = self.api_url(
            &["users", username, "repos"],
            &[("sort", "updated"), ("per_page", REPOS_PER_PAGE)],
        )?;
        self.get_api_json(url).await
    }

    /// Download a raw file body as text.
    pub async fn fetch_raw(&self, download_url: &str) -> Result<String, FetchError> {
        let url = parse_http_url(download_url)?;
        let request = self.http.get(url);
        let response = self.send(request).await?;
        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        String::from_utf8(bytes).map_err(|_| FetchError::InvalidUtf8)
    }

    /// List the posts directory and download every markdown post.
    ///
    /// The listing is fetched first; bodies are then fetched concurrently and
    /// awaited as one batch. Results keep listing order. With
    /// [`BodyFailurePolicy::FailBatch`] the first failed body fails the batch.
    pub async fn fetch_posts(
        &self,
        location: &PostsLocation,
        policy: BodyFailurePolicy,
    ) -> Result<Vec<(ArticleSource, String)>, FetchError> {
        let entries = self
            .list_directory(&location.owner, &location.repo, &location.path)
            .await?;
        let total = entries.len();

        let sources: Vec<ArticleSource> = entries
            .into_iter()
            .filter(ContentEntry::is_markdown_post)
            .map(|entry| to_source(entry, location))
            .collect::<Result<_, _>>()?;

        tracing::debug!(
            listed = total,
            posts = sources.len(),
            path = %location.path,
            "Fetched posts directory listing"
        );

        let fetches = sources.into_iter().map(|source| async move {
            let body = self.fetch_raw(&source.download_url).await;
            (source, body)
        });

        match policy {
            BodyFailurePolicy::FailBatch => {
                try_join_all(fetches.map(|fut| async move {
                    let (source, body) = fut.await;
                    body.map(|body| (source, body))
                }))
                .await
            }
            BodyFailurePolicy::Skip => {
                let mut posts = Vec::new();
                for (source, body) in join_all(fetches).await {
                    match body {
                        Ok(body) => posts.push((source, body)),
                        Err(e) => tracing::warn!(
                            file = %source.name,
                            error = %e,
                            "Skipping post whose body could not be fetched"
                        ),
                    }
                }
                Ok(posts)
            }
        }
    }

    fn api_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_api_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let mut request = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            tracing::trace!("Content host authentication configured");
            request = request.header("Authorization", format!("token {}", token.expose_secret()));
        }

        let response = self.send(request).await?;
        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Schema(e.to_string()))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, FetchError> {
        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout.as_secs()))?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            tracing::debug!(
                url = %response.url(),
                status = %response.status(),
                "Content host returned non-success status"
            );
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }
        Ok(response)
    }
}

fn to_source(entry: ContentEntry, location: &PostsLocation) -> Result<ArticleSource, FetchError> {
    let download_url = entry
        .download_url
        .ok_or_else(|| FetchError::Schema(format!("{} has no download_url", entry.name)))?;
    let permalink = entry
        .html_url
        .unwrap_or_else(|| location.permalink(&entry.path));
    Ok(ArticleSource {
        name: entry.name,
        path: entry.path,
        content_hash: entry.sha,
        download_url,
        permalink,
    })
}

fn parse_http_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|_| FetchError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(FetchError::InvalidUrl(raw.to_string())),
    }
}

pub(crate) async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
