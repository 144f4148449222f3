//! In-process mock of the Schwab streamer.
//!
//! Accepts WebSocket connections on `127.0.0.1`, forwards every command frame
//! the client sends to the test, and writes whatever the test pushes back.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use schwab_streamer::credentials::StaticCredentials;
use schwab_streamer::error::SchwabError;
use schwab_streamer::types::{ConnectionState, StreamerInfo};
use schwab_streamer::ws::StreamObserver;
use schwab_streamer::ws::client::StreamerClient;
use schwab_streamer::ws::codec::Heartbeat;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const TOKEN: &str = "test-access-token";

const WAIT: Duration = Duration::from_secs(5);

enum Outbound {
    Frame(Message),
    /// Drop the TCP connection without a close handshake.
    Drop,
}

pub struct MockStreamer {
    pub url: String,
    requests: mpsc::UnboundedReceiver<Value>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl MockStreamer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (req_tx, requests) = mpsc::unbounded_channel();
        let (outbound, mut out_rx) = mpsc::unbounded_channel::<Outbound>();

        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let Ok(ws) = accept_async(tcp).await else {
                    continue;
                };
                let (mut write, mut read) = ws.split();
                loop {
                    tokio::select! {
                        inbound = read.next() => match inbound {
                            Some(Ok(Message::Text(text))) => {
                                if let Ok(value) = serde_json::from_str::<Value>(text.as_str()) {
                                    let _ = req_tx.send(value);
                                }
                            }
                            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                            Some(Ok(_)) => {}
                        },
                        out = out_rx.recv() => match out {
                            Some(Outbound::Frame(msg)) => {
                                if write.send(msg).await.is_err() {
                                    break;
                                }
                            }
                            Some(Outbound::Drop) | None => break,
                        },
                    }
                }
            }
        });

        Self {
            url: format!("ws://{addr}"),
            requests,
            outbound,
        }
    }

    pub fn streamer_info(&self) -> StreamerInfo {
        StreamerInfo {
            streamer_socket_url: self.url.clone(),
            schwab_client_customer_id: "customer-1".into(),
            schwab_client_correl_id: "correl-1".into(),
            schwab_client_channel: "N9".into(),
            schwab_client_function_id: "APIAPP".into(),
        }
    }

    pub fn credentials(&self) -> StaticCredentials {
        StaticCredentials::new(self.streamer_info(), TOKEN)
    }

    /// Next command frame from the client. Panics after five seconds.
    pub async fn next_request(&mut self) -> Value {
        timeout(WAIT, self.requests.recv())
            .await
            .expect("timed out waiting for a request")
            .expect("mock streamer stopped")
    }

    /// Assert that the client sends nothing for `wait`.
    pub async fn assert_no_request(&mut self, wait: Duration) {
        if let Ok(Some(frame)) = timeout(wait, self.requests.recv()).await {
            panic!("unexpected request: {frame}");
        }
    }

    /// Answer `request` with the given code and message.
    pub fn respond(&self, request: &Value, code: i64, msg: &str) {
        self.push(json!({
            "response": [{
                "service": request["service"],
                "command": request["command"],
                "requestid": request["requestid"],
                "SchwabClientCorrelId": request["SchwabClientCorrelId"],
                "timestamp": 1_700_000_000_000_i64,
                "content": {"code": code, "msg": msg}
            }]
        }));
    }

    pub fn push(&self, frame: Value) {
        self.push_raw(frame.to_string());
    }

    pub fn push_raw(&self, raw: impl Into<String>) {
        let raw: String = raw.into();
        let _ = self.outbound.send(Outbound::Frame(Message::Text(raw.into())));
    }

    /// Orderly close handshake from the server side.
    pub fn close(&self) {
        let _ = self.outbound.send(Outbound::Frame(Message::Close(None)));
    }

    /// Abrupt socket loss.
    pub fn drop_connection(&self) {
        let _ = self.outbound.send(Outbound::Drop);
    }
}

/// A client for `mock` with a five-second request timeout.
pub fn client(mock: &MockStreamer) -> StreamerClient<StaticCredentials> {
    StreamerClient::builder(mock.credentials())
        .request_timeout(WAIT)
        .build()
}

/// Connect and complete the login handshake. Returns the login frame.
pub async fn logged_in(
    mock: &mut MockStreamer,
    streamer: &StreamerClient<StaticCredentials>,
) -> Value {
    streamer.connect().await.unwrap();
    let (result, frame) = tokio::join!(streamer.login(), async {
        let frame = mock.next_request().await;
        mock.respond(&frame, 0, "server=s0;status=PN");
        frame
    });
    result.unwrap();
    frame
}

/// Poll until the client reaches `state`. Panics after five seconds.
pub async fn wait_for_state(streamer: &StreamerClient<StaticCredentials>, state: ConnectionState) {
    timeout(WAIT, async {
        while streamer.state() != state {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("never reached {state:?}, stuck in {:?}", streamer.state()));
}

/// What a [`RecordingObserver`] saw.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Heartbeat(i64),
    Notify(Value),
    Unhandled(String),
    Error(String),
    Close,
}

/// Observer that forwards every event to a channel.
pub struct RecordingObserver {
    tx: mpsc::UnboundedSender<Observed>,
    pub log: Arc<Mutex<Vec<Observed>>>,
}

impl RecordingObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Observed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                log: Arc::new(Mutex::new(vec![])),
            },
            rx,
        )
    }

    fn record(&self, event: Observed) {
        self.log.lock().unwrap().push(event.clone());
        let _ = self.tx.send(event);
    }
}

impl StreamObserver for RecordingObserver {
    fn on_heartbeat(&self, heartbeat: &Heartbeat) {
        self.record(Observed::Heartbeat(heartbeat.millis));
    }

    fn on_notify(&self, notice: &Value) {
        self.record(Observed::Notify(notice.clone()));
    }

    fn on_unhandled(&self, raw: &str) {
        self.record(Observed::Unhandled(raw.to_owned()));
    }

    fn on_error(&self, error: &SchwabError) {
        self.record(Observed::Error(error.to_string()));
    }

    fn on_close(&self) {
        self.record(Observed::Close);
    }
}

/// Next observed event. Panics after five seconds.
pub async fn next_observed(rx: &mut mpsc::UnboundedReceiver<Observed>) -> Observed {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for an observer event")
        .expect("observer dropped")
}
