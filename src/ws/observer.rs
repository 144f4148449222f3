//! Out-of-band callbacks for traffic that has no caller waiting on it.
//!
//! Heartbeats, session notices, unclassified frames, malformed frames and
//! transport failures all go to a [`StreamObserver`] rather than to the
//! per-service handlers. Every method has a no-op default.

use serde_json::Value;

use crate::error::SchwabError;
use crate::ws::codec::Heartbeat;

/// Receives session-level events from the receive loop.
///
/// Called on the receive loop, so implementations must not block. A panic in
/// any callback is logged and the session carries on.
pub trait StreamObserver: Send + Sync {
    fn on_heartbeat(&self, _heartbeat: &Heartbeat) {}

    /// A `notify` entry that is not a heartbeat.
    fn on_notify(&self, _notice: &Value) {}

    /// Valid JSON that is not a response, data or notify envelope.
    fn on_unhandled(&self, _raw: &str) {}

    /// A malformed frame, or the transport failure that ended the session.
    fn on_error(&self, _error: &SchwabError) {}

    /// The session ended, for whatever reason.
    fn on_close(&self) {}
}

/// Default observer: logs everything through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StreamObserver for TracingObserver {
    fn on_heartbeat(&self, heartbeat: &Heartbeat) {
        tracing::trace!(millis = heartbeat.millis, "Heartbeat");
    }

    fn on_notify(&self, notice: &Value) {
        tracing::info!(%notice, "Streamer notice");
    }

    fn on_unhandled(&self, raw: &str) {
        tracing::debug!("Unhandled frame: {raw}");
    }

    fn on_error(&self, error: &SchwabError) {
        tracing::warn!(%error, "Streamer error");
    }

    fn on_close(&self) {
        tracing::info!("Streamer session closed");
    }
}
