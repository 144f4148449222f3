//! Request and response types for the Schwab APIs.
//!
//! - [`enums`]: Streamer services, commands, response codes and connection states
//! - [`user_preference`]: User preference payload carrying the streamer parameters
//!
//! All enums are re-exported at the module root via `pub use enums::*`.

pub mod enums;
pub mod user_preference;

pub use enums::*;
pub use user_preference::StreamerInfo;
