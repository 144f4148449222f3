//! WebSocket streaming for the Schwab streamer.
//!
//! The streamer is a single JSON-over-WebSocket connection that multiplexes
//! command responses, subscription data and heartbeats.
//!
//! ## [`client`]: Connection and session manager
//!
//! [`StreamerClient`](client::StreamerClient) connects, logs in, sends
//! commands and runs the background receive loop.
//!
//! ## [`correlator`]: Request correlation
//!
//! Matches `response` entries to the command that caused them by
//! `requestid`, with a per-request timeout.
//!
//! ## [`registry`]: Data handlers
//!
//! Per-service handler lists, dispatched in registration order with panic
//! isolation.
//!
//! ## [`codec`] and [`fields`]: Wire format
//!
//! Envelope classification, outbound command frames, and the positional
//! field tables used to relabel data pushes.
//!
//! ## Limits
//!
//! - One streamer connection per login
//! - `SUBS` replaces the key set of a service; use `ADD` to extend it

pub mod client;
pub mod codec;
pub mod correlator;
pub mod fields;
pub mod observer;
pub mod registry;

pub use client::{MessageStream, StreamerClient, StreamerClientBuilder, StreamerConfig};
pub use codec::{FrameDecoder, SchemaDecoder, StreamMessage};
pub use observer::{StreamObserver, TracingObserver};
pub use registry::Handler;
