//! Core HTTP client for the Schwab Trader REST API.
//!
//! The [`SchwabClient`] struct wraps [`reqwest::Client`] with a bearer
//! `Authorization` header and provides a typed `get`. The streaming client
//! only needs one endpoint from it (user preferences, which carry the
//! streamer connection parameters); that endpoint is added via an `impl`
//! block in [`crate::api`].
//!
//! Token acquisition and refresh happen elsewhere. Hand the client a valid
//! access token and replace it with [`SchwabClient::set_access_token`] when
//! it rotates.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::constants::API_BASE_URL;
use crate::error::{ApiErrorBody, Result, SchwabError};
use crate::types::StreamerInfo;

/// Core HTTP client for the Schwab Trader REST API.
///
/// Cloning is cheap and clones share the cached streamer info.
///
/// # Example
///
/// ```no_run
/// use schwab_streamer::client::SchwabClient;
///
/// # #[tokio::main]
/// # async fn main() -> schwab_streamer::error::Result<()> {
/// let client = SchwabClient::new("your-access-token")?;
/// let prefs = client.get_user_preference().await?;
/// println!("{} streamer endpoints", prefs.streamer_info.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SchwabClient {
    http: reqwest::Client,
    /// OAuth access token.
    access_token: String,
    /// Base URL for REST API requests (defaults to [`API_BASE_URL`]).
    base_url: String,
    /// Pre-built `Authorization: Bearer …` value.
    auth_header: HeaderValue,
    /// Streamer parameters from the last user-preference fetch.
    streamer_info: Arc<RwLock<Option<StreamerInfo>>>,
}

impl SchwabClient {
    /// Create a new `SchwabClient` with the given access token.
    ///
    /// Uses the default API base URL (`https://api.schwabapi.com`).
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(access_token, API_BASE_URL)
    }

    /// Create a new `SchwabClient` pointing at a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .default_headers(Self::default_headers())
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_owned();
        url::Url::parse(&base_url)?;

        let access_token = access_token.into();
        let auth_header = Self::bearer(&access_token)?;

        Ok(Self {
            http,
            access_token,
            base_url,
            auth_header,
            streamer_info: Arc::new(RwLock::new(None)),
        })
    }

    /// Returns the current access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Replace the access token (e.g. after a refresh).
    pub fn set_access_token(&mut self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        self.auth_header = Self::bearer(&token)?;
        self.access_token = token;
        Ok(())
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Streamer parameters cached by the last
    /// [`get_user_preference`](Self::get_user_preference) call.
    pub fn cached_streamer_info(&self) -> Option<StreamerInfo> {
        self.streamer_info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn cache_streamer_info(&self, info: Option<StreamerInfo>) {
        *self
            .streamer_info
            .write()
            .unwrap_or_else(PoisonError::into_inner) = info;
    }

    // -----------------------------------------------------------------------
    // Generic HTTP helpers
    // -----------------------------------------------------------------------

    /// Perform a GET request and deserialize the JSON response.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");

        let resp = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, self.auth_header.clone())
            .send()
            .await?;

        self.handle_response(resp).await
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Build the full URL from a path segment.
    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Default headers applied to every request.
    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn bearer(token: &str) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            SchwabError::InvalidArgument("access token contains invalid header characters".into())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Read a response, returning either the deserialized body or a `SchwabError`.
    async fn handle_response<R: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<R> {
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(SchwabError::Json)
        } else {
            let body = String::from_utf8_lossy(&bytes);
            Err(self.parse_error_body(status, &body))
        }
    }

    /// Try to parse the API's JSON error structure; fall back to a raw HTTP
    /// status error.
    pub(crate) fn parse_error_body(&self, status: reqwest::StatusCode, body: &str) -> SchwabError {
        if let Ok(api_err) = serde_json::from_str::<ApiErrorBody>(body) {
            if api_err.message.is_some() || api_err.errors.is_some() {
                return SchwabError::Api(api_err);
            }
        }
        SchwabError::HttpStatus {
            status,
            body: body.to_owned(),
        }
    }
}
