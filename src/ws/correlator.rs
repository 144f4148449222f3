//! Request/response correlation over the shared streamer socket.
//!
//! Every command gets a fresh request id and a `oneshot` completion. The
//! receive loop settles completions by id as `response` entries arrive, so
//! answers may come back in any order and interleave freely with data pushes.
//!
//! A pending request leaves the map exactly once: when its response is
//! settled, when its timeout fires, or when the session tears down.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::{Result, SchwabError};
use crate::types::enums::{Command, ResponseCode};
use crate::ws::codec::{RequestIdentity, ResponseEntry, encode_request};

struct PendingRequest {
    service: String,
    command: Command,
    created_at: Instant,
    completion: oneshot::Sender<Result<Value>>,
}

/// Tracks in-flight commands for one session.
pub struct RequestCorrelator {
    identity: RequestIdentity,
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, PendingRequest>>,
    timeout: Duration,
}

impl RequestCorrelator {
    /// A correlator whose ids start at 0.
    pub fn new(identity: RequestIdentity, timeout: Duration) -> Self {
        Self {
            identity,
            next_id: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Number of commands awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// Send a command and wait for its disposition.
    ///
    /// `transmit` receives the serialized frame and writes it to the socket.
    /// No lock is held while it runs or while waiting, so the receive loop
    /// keeps settling other requests in the meantime.
    pub async fn send<F, Fut>(
        &self,
        service: &str,
        command: Command,
        parameters: Option<Value>,
        transmit: F,
    ) -> Result<Value>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = encode_request(
            &self.identity,
            request_id,
            service,
            command,
            parameters.as_ref(),
        )?;

        let (tx, rx) = oneshot::channel();
        self.pending().insert(
            request_id,
            PendingRequest {
                service: service.to_owned(),
                command,
                created_at: Instant::now(),
                completion: tx,
            },
        );

        if let Err(e) = transmit(frame).await {
            self.pending().remove(&request_id);
            return Err(e);
        }

        tracing::debug!(request_id, %service, %command, "Request sent");

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result,
            // Sender dropped without settling: the map was cleared.
            Ok(Err(_)) => Err(SchwabError::ConnectionClosed),
            Err(_) => {
                self.pending().remove(&request_id);
                tracing::warn!(request_id, %service, %command, "Request timed out");
                Err(SchwabError::RequestTimeout {
                    request_id,
                    service: service.to_owned(),
                    command,
                })
            }
        }
    }

    /// Resolve the request a response entry refers to.
    ///
    /// Returns `false` when no such request is pending (already timed out,
    /// or never issued by this session).
    pub fn settle(&self, request_id: u64, entry: &ResponseEntry) -> bool {
        let Some(pending) = self.pending().remove(&request_id) else {
            tracing::debug!(
                request_id,
                service = %entry.service,
                command = %entry.command,
                "Ignoring response for unknown request"
            );
            return false;
        };

        let result = match entry.code() {
            Some(code) if ResponseCode::is_success(code) => Ok(entry.content.clone()),
            code => Err(SchwabError::StreamerRejected {
                code: code.unwrap_or(-1),
                message: entry.message().to_owned(),
            }),
        };

        tracing::debug!(
            request_id,
            service = %pending.service,
            command = %pending.command,
            code = ?entry.code(),
            kind = ?entry.code().and_then(ResponseCode::from_code),
            elapsed_ms = pending.created_at.elapsed().as_millis() as u64,
            "Request settled"
        );

        // The caller may have given up already; nothing to do then.
        let _ = pending.completion.send(result);
        true
    }

    /// Fail every pending request with the error `make` produces.
    pub fn fail_all(&self, make: impl Fn() -> SchwabError) {
        let drained: Vec<_> = self.pending().drain().collect();
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "Failing outstanding requests");
        }
        for (_, pending) in drained {
            let _ = pending.completion.send(Err(make()));
        }
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<u64, PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
