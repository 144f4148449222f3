//! REST API endpoint implementations.
//!
//! Each sub-module adds `async` methods to
//! [`SchwabClient`](crate::client::SchwabClient) via `impl` blocks. Only the
//! endpoints the streamer depends on are implemented.
//!
//! | Module | Endpoints | Description |
//! |---|---|---|
//! | [`user_preference`] | 1 | User preferences and streamer connection parameters |

pub mod user_preference;
