//! Shared enum types that map directly to Schwab Streamer wire values.
//!
//! Variant names use `SCREAMING_SNAKE_CASE` to match the service and command
//! strings the streamer expects, so we suppress the Rust naming convention lint.
#![allow(non_camel_case_types)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchwabError;

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// A named data stream on the streamer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    /// Session administration (login/logout).
    ADMIN,
    /// Level one equity quotes.
    LEVELONE_EQUITIES,
    /// Level one option quotes.
    LEVELONE_OPTIONS,
    /// Level one futures quotes.
    LEVELONE_FUTURES,
    /// Level one futures-option quotes.
    LEVELONE_FUTURES_OPTIONS,
    /// Level one forex quotes.
    LEVELONE_FOREX,
    /// NYSE order book.
    NYSE_BOOK,
    /// NASDAQ order book.
    NASDAQ_BOOK,
    /// Options order book.
    OPTIONS_BOOK,
    /// Minute candles for equities.
    CHART_EQUITY,
    /// Minute candles for futures.
    CHART_FUTURES,
    /// Equity movers screener.
    SCREENER_EQUITY,
    /// Option movers screener.
    SCREENER_OPTION,
    /// Order and fill activity for the logged-in accounts.
    ACCT_ACTIVITY,
}

impl Service {
    /// Every service, `ADMIN` first.
    pub const ALL: [Service; 14] = [
        Self::ADMIN,
        Self::LEVELONE_EQUITIES,
        Self::LEVELONE_OPTIONS,
        Self::LEVELONE_FUTURES,
        Self::LEVELONE_FUTURES_OPTIONS,
        Self::LEVELONE_FOREX,
        Self::NYSE_BOOK,
        Self::NASDAQ_BOOK,
        Self::OPTIONS_BOOK,
        Self::CHART_EQUITY,
        Self::CHART_FUTURES,
        Self::SCREENER_EQUITY,
        Self::SCREENER_OPTION,
        Self::ACCT_ACTIVITY,
    ];

    /// The wire name of the service.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ADMIN => "ADMIN",
            Self::LEVELONE_EQUITIES => "LEVELONE_EQUITIES",
            Self::LEVELONE_OPTIONS => "LEVELONE_OPTIONS",
            Self::LEVELONE_FUTURES => "LEVELONE_FUTURES",
            Self::LEVELONE_FUTURES_OPTIONS => "LEVELONE_FUTURES_OPTIONS",
            Self::LEVELONE_FOREX => "LEVELONE_FOREX",
            Self::NYSE_BOOK => "NYSE_BOOK",
            Self::NASDAQ_BOOK => "NASDAQ_BOOK",
            Self::OPTIONS_BOOK => "OPTIONS_BOOK",
            Self::CHART_EQUITY => "CHART_EQUITY",
            Self::CHART_FUTURES => "CHART_FUTURES",
            Self::SCREENER_EQUITY => "SCREENER_EQUITY",
            Self::SCREENER_OPTION => "SCREENER_OPTION",
            Self::ACCT_ACTIVITY => "ACCT_ACTIVITY",
        }
    }

    /// Whether the service accepts `VIEW` (changing the field set of an
    /// existing subscription).
    pub fn supports_view(self) -> bool {
        !matches!(self, Self::ADMIN | Self::ACCT_ACTIVITY)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = SchwabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|svc| svc.as_str() == s)
            .ok_or_else(|| SchwabError::InvalidArgument(format!("unknown service: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// The verb applied to a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    LOGIN,
    LOGOUT,
    /// Replace the subscription with the given keys.
    SUBS,
    /// Remove keys from the subscription.
    UNSUBS,
    /// Add keys to the existing subscription.
    ADD,
    /// Change the field set of the subscription.
    VIEW,
}

impl Command {
    /// The wire name of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LOGIN => "LOGIN",
            Self::LOGOUT => "LOGOUT",
            Self::SUBS => "SUBS",
            Self::UNSUBS => "UNSUBS",
            Self::ADD => "ADD",
            Self::VIEW => "VIEW",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Response Code
// ---------------------------------------------------------------------------

/// Codes carried in `response[].content.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum ResponseCode {
    SUCCESS = 0,
    LOGIN_DENIED = 3,
    UNKNOWN_FAILURE = 9,
    SERVICE_NOT_AVAILABLE = 11,
    CLOSE_CONNECTION = 12,
    REACHED_SYMBOL_LIMIT = 19,
    STREAM_CONN_NOT_FOUND = 20,
    BAD_COMMAND_FORMAT = 21,
    FAILED_COMMAND_SUBS = 22,
    FAILED_COMMAND_UNSUBS = 23,
    FAILED_COMMAND_ADD = 24,
    FAILED_COMMAND_VIEW = 25,
    SUCCEEDED_COMMAND_SUBS = 26,
    SUCCEEDED_COMMAND_UNSUBS = 27,
    SUCCEEDED_COMMAND_ADD = 28,
    SUCCEEDED_COMMAND_VIEW = 29,
    STOP_STREAMING = 30,
}

impl ResponseCode {
    /// Look up a documented code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::SUCCESS),
            3 => Some(Self::LOGIN_DENIED),
            9 => Some(Self::UNKNOWN_FAILURE),
            11 => Some(Self::SERVICE_NOT_AVAILABLE),
            12 => Some(Self::CLOSE_CONNECTION),
            19 => Some(Self::REACHED_SYMBOL_LIMIT),
            20 => Some(Self::STREAM_CONN_NOT_FOUND),
            21 => Some(Self::BAD_COMMAND_FORMAT),
            22 => Some(Self::FAILED_COMMAND_SUBS),
            23 => Some(Self::FAILED_COMMAND_UNSUBS),
            24 => Some(Self::FAILED_COMMAND_ADD),
            25 => Some(Self::FAILED_COMMAND_VIEW),
            26 => Some(Self::SUCCEEDED_COMMAND_SUBS),
            27 => Some(Self::SUCCEEDED_COMMAND_UNSUBS),
            28 => Some(Self::SUCCEEDED_COMMAND_ADD),
            29 => Some(Self::SUCCEEDED_COMMAND_VIEW),
            30 => Some(Self::STOP_STREAMING),
            _ => None,
        }
    }

    /// Whether a raw code settles a request successfully. Undocumented codes
    /// count as failures.
    pub fn is_success(code: i64) -> bool {
        crate::constants::streaming::SUCCESS_CODES.contains(&code)
    }
}

// ---------------------------------------------------------------------------
// Connection State
// ---------------------------------------------------------------------------

/// Lifecycle of a streamer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    LoggedIn,
    Closing,
}
