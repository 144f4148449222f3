//! Where the streamer gets its connection parameters and access token.
//!
//! [`StreamerClient`](crate::ws::client::StreamerClient) is generic over a
//! [`StreamerInfoProvider`]. [`SchwabClient`] implements it from its cached
//! user preferences; [`StaticCredentials`] implements it from fixed values.

use std::future::Future;

use crate::client::SchwabClient;
use crate::error::{Result, SchwabError};
use crate::types::StreamerInfo;

/// Supplies the streamer parameters and bearer token.
pub trait StreamerInfoProvider: Send + Sync + 'static {
    /// The streamer connection parameters. Fails with
    /// [`SchwabError::CredentialsUnavailable`] when none are known yet.
    fn streamer_info(&self) -> impl Future<Output = Result<StreamerInfo>> + Send;

    /// The bearer token sent in the login request.
    fn access_token(&self) -> impl Future<Output = Result<String>> + Send;
}

impl StreamerInfoProvider for SchwabClient {
    async fn streamer_info(&self) -> Result<StreamerInfo> {
        self.cached_streamer_info()
            .ok_or(SchwabError::CredentialsUnavailable)
    }

    async fn access_token(&self) -> Result<String> {
        Ok(SchwabClient::access_token(self).to_owned())
    }
}

/// Fixed credentials, for callers that already hold both pieces.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    info: Option<StreamerInfo>,
    access_token: String,
}

impl StaticCredentials {
    /// Credentials with known streamer parameters.
    pub fn new(info: StreamerInfo, access_token: impl Into<String>) -> Self {
        Self {
            info: Some(info),
            access_token: access_token.into(),
        }
    }

    /// Credentials with a token but no streamer parameters yet.
    pub fn token_only(access_token: impl Into<String>) -> Self {
        Self {
            info: None,
            access_token: access_token.into(),
        }
    }
}

impl StreamerInfoProvider for StaticCredentials {
    async fn streamer_info(&self) -> Result<StreamerInfo> {
        self.info.clone().ok_or(SchwabError::CredentialsUnavailable)
    }

    async fn access_token(&self) -> Result<String> {
        Ok(self.access_token.clone())
    }
}
