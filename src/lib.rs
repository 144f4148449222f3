//! # schwab-streamer
//!
//! A Rust client for the Charles Schwab Trader API streamer: real-time
//! level-one quotes, order books, charts, screeners and account activity over
//! a single WebSocket.
//!
//! ## Quick Start
//!
//! ```no_run
//! use schwab_streamer::{SchwabClient, StreamerClient};
//!
//! #[tokio::main]
//! async fn main() -> schwab_streamer::error::Result<()> {
//!     let rest = SchwabClient::new("your-access-token")?;
//!     rest.get_user_preference().await?;
//!
//!     let streamer = StreamerClient::new(rest);
//!     streamer.connect().await?;
//!     streamer.login().await?;
//!     streamer.level_one_equities_subs(&["AAPL"], None).await?;
//!
//!     let mut messages = streamer.messages()?;
//!     while let Some(msg) = messages.next_message().await {
//!         println!("{msg:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod types;
pub mod ws;

/// Re-export the REST client at crate root for convenience.
pub use client::SchwabClient;
pub use credentials::{StaticCredentials, StreamerInfoProvider};
/// Re-export the error type and Result alias.
pub use error::{Result, SchwabError};
pub use types::{Service, StreamerInfo};
pub use ws::{StreamMessage, StreamerClient};
