//! Constants for the Schwab Trader API and Streamer API.
//!
//! Contains the REST base URL, the user-preference path that carries the
//! streamer connection parameters, and streaming defaults. These are used
//! internally by [`SchwabClient`](crate::client::SchwabClient) and
//! [`StreamerClient`](crate::ws::client::StreamerClient), but are also
//! exported for advanced usage.

// ---------------------------------------------------------------------------
// Base URLs
// ---------------------------------------------------------------------------

/// Base URL for the Schwab Trader REST API.
pub const API_BASE_URL: &str = "https://api.schwabapi.com";

/// Path of the user-preference endpoint (returns `streamerInfo`).
pub const USER_PREFERENCE_PATH: &str = "/trader/v1/userPreference";

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

/// Streamer protocol defaults.
pub mod streaming {
    /// Seconds a command may stay unanswered before it fails.
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Broadcast capacity of the pull-style message channel.
    pub const MESSAGE_CHANNEL_CAPACITY: usize = 4096;

    /// Subscription key the `ACCT_ACTIVITY` service expects.
    pub const ACCOUNT_ACTIVITY_KEY: &str = "Account Activity";

    /// Response codes that mean the command succeeded.
    pub const SUCCESS_CODES: [i64; 5] = [0, 26, 27, 28, 29];
}
