//! Error types for the `schwab-streamer` crate.
//!
//! All fallible operations in this crate return [`Result<T>`], which is an
//! alias for `std::result::Result<T, SchwabError>`.
//!
//! [`SchwabError`] covers:
//! - **Streaming errors**: Login rejections, per-command rejections, request
//!   timeouts, dropped connections and malformed frames
//! - **Precondition errors**: Missing streamer credentials, not connected,
//!   not logged in
//! - **API errors**: Structured error responses from the Schwab REST API
//! - **HTTP status / transport errors**: Unexpected status codes, network failures
//! - **WebSocket errors**: Socket-level connection and protocol errors

use std::fmt;

use crate::types::enums::{Command, ConnectionState};

/// Error response returned by the Schwab REST API.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable description of the error.
    #[serde(default)]
    pub message: Option<String>,
    /// Additional detail lines, when present.
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message.as_deref().unwrap_or("No message"))?;
        if let Some(errors) = self.errors.as_ref().filter(|e| !e.is_empty()) {
            write!(f, " ({})", errors.join("; "))?;
        }
        Ok(())
    }
}

/// All possible errors produced by the `schwab-streamer` client.
#[derive(Debug, thiserror::Error)]
pub enum SchwabError {
    /// The credential collaborator has no streamer info yet (user
    /// preferences were never fetched).
    #[error("streamer credentials unavailable: fetch user preferences first")]
    CredentialsUnavailable,

    /// An operation that needs an open socket was called while disconnected.
    #[error("streamer is not connected")]
    NotConnected,

    /// A subscription command was issued before a successful login.
    #[error("streamer is not logged in")]
    NotLoggedIn,

    /// The operation is not valid in the current connection state.
    #[error("invalid connection state: {0:?}")]
    InvalidState(ConnectionState),

    /// The server rejected the `ADMIN/LOGIN` request.
    #[error("login denied [{code}]: {message}")]
    LoginDenied {
        /// Streamer response code (e.g. `3`).
        code: i64,
        /// Message returned by the streamer.
        message: String,
    },

    /// The server rejected a specific command. The connection stays usable.
    #[error("streamer rejected command [{code}]: {message}")]
    StreamerRejected {
        /// Streamer response code.
        code: i64,
        /// Message returned by the streamer.
        message: String,
    },

    /// No response arrived for a command within the configured window.
    #[error("request {request_id} ({service}/{command}) timed out")]
    RequestTimeout {
        /// The id the request was sent with.
        request_id: u64,
        /// Service the request targeted.
        service: String,
        /// Command verb of the request.
        command: Command,
    },

    /// The connection was closed while the request was in flight.
    #[error("connection closed")]
    ConnectionClosed,

    /// The connection dropped because of a socket-level failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A single inbound frame could not be parsed.
    #[error("failed to decode frame: {source}")]
    Decode {
        /// The raw frame text.
        raw: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// An error response returned by the Schwab REST API.
    #[error("API error: {0}")]
    Api(ApiErrorBody),

    /// The server returned an unexpected HTTP status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code.
        status: reqwest::StatusCode,
        /// The response body text.
        body: String,
    },

    /// A network or transport-level error from `reqwest`.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to serialize or deserialize JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A WebSocket-level error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// An error building or parsing a URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The caller provided an invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl SchwabError {
    /// Whether this error came from the socket itself. Transport errors end
    /// the session.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::WebSocket(_) | Self::Transport(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SchwabError>;
