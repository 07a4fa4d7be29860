// crates/folio-services/src/directory.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use folio_core::DirectoryConfig;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::retry::{with_retry, RetryConfig};

const USER_AGENT: &str = "folio-sync";

/// Errors from the public repository directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory answered with a non-success status
    #[error("GitHub API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response
    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid GitHub API URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected GitHub response: {0}")]
    Decode(String),
}

impl DirectoryError {
    /// HTTP status of the failed call, if the directory answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            DirectoryError::Status { status, .. } => Some(*status),
            DirectoryError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

/// A public repository as listed by the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryRepo {
    /// Immutable numeric id; survives renames
    pub id: i64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DirectoryRepo {
    /// Homepage, when the owner actually set one
    pub fn demo_url(&self) -> Option<String> {
        self.homepage
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
    }
}

/// Public profile of a directory account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub login: String,
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Read-only client for the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubDirectory {
    base_url: Url,
    client: Arc<Client>,
    token: Option<String>,
    retry: RetryConfig,
}

impl GitHubDirectory {
    /// Create a client from configuration
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Self::with_client(&config.api_url, config.token.clone(), client)
    }

    /// Create a client against an arbitrary API root (mock servers, GHE)
    pub fn new_with_base_url(
        base_url: &str,
        token: Option<String>,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Self::with_client(base_url, token, client)
    }

    fn with_client(
        base_url: &str,
        token: Option<String>,
        client: Client,
    ) -> Result<Self, DirectoryError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| DirectoryError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::InvalidUrl(base_url.to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            client: Arc::new(client),
            token: token.filter(|t| !t.is_empty()),
            retry: RetryConfig::default(),
        })
    }

    /// Override the backoff used for per-repository lookups
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| DirectoryError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn languages_endpoint(&self, full_name: &str) -> Result<Url, DirectoryError> {
        self.endpoint(
            ["repos"]
                .into_iter()
                .chain(full_name.split('/'))
                .chain(["languages"]),
        )
    }

    fn build_request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::USER_AGENT, USER_AGENT)
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => req.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => req,
        }
    }

    async fn check_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DirectoryError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DirectoryError> {
        response
            .json()
            .await
            .map_err(|e| DirectoryError::Decode(e.to_string()))
    }

    /// Fetch an account's public profile
    pub async fn get_user(&self, handle: &str) -> Result<AccountProfile, DirectoryError> {
        tracing::debug!("Fetching GitHub profile for {}", handle);

        let url = self.endpoint(["users", handle])?;
        let response = self.build_request(self.client.get(url)).send().await?;
        let response = self.check_response(response).await?;
        Self::decode(response).await
    }

    /// Whether the account exists; any failure other than 404 is an error
    pub async fn account_exists(&self, handle: &str) -> Result<bool, DirectoryError> {
        match self.get_user(handle).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// First page of public repositories, most recently updated first
    pub async fn list_repos(&self, handle: &str) -> Result<Vec<DirectoryRepo>, DirectoryError> {
        tracing::debug!("Fetching repositories for {}", handle);

        let url = self.endpoint(["users", handle, "repos"])?;
        let request = self.build_request(
            self.client
                .get(url)
                .query(&[("sort", "updated"), ("per_page", "100")]),
        );

        let response = request.send().await?;
        let response = self.check_response(response).await?;
        let repos: Vec<DirectoryRepo> = Self::decode(response).await?;

        tracing::info!("Fetched {} repositories for {}", repos.len(), handle);
        Ok(repos)
    }

    /// Most-starred repositories, for the public page's highlights
    pub async fn featured_repos(
        &self,
        handle: &str,
        limit: usize,
    ) -> Result<Vec<DirectoryRepo>, DirectoryError> {
        let url = self.endpoint(["users", handle, "repos"])?;
        let per_page = limit.clamp(1, 100).to_string();
        let request = self.build_request(
            self.client
                .get(url)
                .query(&[("sort", "stars"), ("per_page", per_page.as_str())]),
        );

        let response = request.send().await?;
        let response = self.check_response(response).await?;
        let mut repos: Vec<DirectoryRepo> = Self::decode(response).await?;
        repos.truncate(limit);
        Ok(repos)
    }

    /// Language names of a repository, largest share first
    ///
    /// `full_name` is `owner/repo`. Transient failures are retried.
    pub async fn repo_languages(&self, full_name: &str) -> Result<Vec<String>, DirectoryError> {
        let url = self.languages_endpoint(full_name)?;

        let response = with_retry(&self.retry, || {
            self.build_request(self.client.get(url.clone())).send()
        })
        .await?;
        let response = self.check_response(response).await?;
        let bytes: HashMap<String, u64> = Self::decode(response).await?;

        let mut languages: Vec<(String, u64)> = bytes.into_iter().collect();
        languages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(languages.into_iter().map(|(name, _)| name).collect())
    }
}
