//! User preference types, including the streamer connection parameters.

use serde::{Deserialize, Serialize};

/// Response of `GET /trader/v1/userPreference`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreference {
    /// Per-account display preferences.
    #[serde(default)]
    pub accounts: Vec<UserPreferenceAccount>,
    /// Streamer connection parameters. The first entry is the one to use.
    #[serde(default)]
    pub streamer_info: Vec<StreamerInfo>,
    /// Market data entitlements.
    #[serde(default)]
    pub offers: Vec<Offer>,
}

/// Display preferences for a single account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferenceAccount {
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub primary_account: Option<bool>,
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
    #[serde(default)]
    pub nick_name: Option<String>,
    #[serde(default)]
    pub account_color: Option<String>,
    #[serde(default)]
    pub display_acct_id: Option<String>,
    #[serde(default)]
    pub auto_position_effect: Option<bool>,
}

/// Connection parameters for the streamer.
///
/// Immutable for the life of a session; every outbound command carries the
/// customer and correlation ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamerInfo {
    /// WebSocket URL to connect to.
    pub streamer_socket_url: String,
    /// Sent as `SchwabClientCustomerId` on every request.
    pub schwab_client_customer_id: String,
    /// Sent as `SchwabClientCorrelId` on every request.
    pub schwab_client_correl_id: String,
    /// Sent as `SchwabClientChannel` in the login request.
    pub schwab_client_channel: String,
    /// Sent as `SchwabClientFunctionId` in the login request.
    pub schwab_client_function_id: String,
}

/// Market data entitlement flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(default)]
    pub level2_permissions: Option<bool>,
    #[serde(default)]
    pub mkt_data_permission: Option<String>,
}
