//! Streamer connection and session manager.
//!
//! [`StreamerClient`] owns one WebSocket connection to the Schwab streamer.
//! A background receive loop reads every frame, settles command responses
//! through the [`RequestCorrelator`], and pushes relabeled data to the
//! [`SubscriptionRegistry`] handlers and to any [`MessageStream`]s.
//!
//! # State machine
//!
//! ```text
//! Disconnected ──connect()──▶ Connecting ──socket open──▶ Connected
//!      ▲                                                     │
//!      │                                                 login() ok
//!      │                                                     ▼
//!      └──────── logout() / close() / socket drop ─────── LoggedIn
//! ```
//!
//! Any transport failure returns the client to `Disconnected` and fails
//! every in-flight command. There is no automatic reconnect: call
//! [`connect`](StreamerClient::connect), [`login`](StreamerClient::login)
//! and re-subscribe. Registered handlers survive.
//!
//! # Example
//!
//! ```no_run
//! use schwab_streamer::client::SchwabClient;
//! use schwab_streamer::types::Service;
//! use schwab_streamer::ws::client::StreamerClient;
//!
//! # #[tokio::main]
//! # async fn main() -> schwab_streamer::error::Result<()> {
//! let rest = SchwabClient::new("your-access-token")?;
//! rest.get_user_preference().await?;
//!
//! let streamer = StreamerClient::new(rest);
//! streamer.on_data(Service::LEVELONE_EQUITIES, |msg| {
//!     for quote in &msg.content {
//!         println!("{:?} bid={:?}", quote.get("key"), quote.get("BID_PRICE"));
//!     }
//! });
//!
//! streamer.connect().await?;
//! streamer.login().await?;
//! streamer.level_one_equities_subs(&["AAPL", "MSFT"], None).await?;
//! # Ok(())
//! # }
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::constants::streaming::{
    ACCOUNT_ACTIVITY_KEY, MESSAGE_CHANNEL_CAPACITY, REQUEST_TIMEOUT_SECS,
};
use crate::credentials::StreamerInfoProvider;
use crate::error::{Result, SchwabError};
use crate::types::StreamerInfo;
use crate::types::enums::{Command, ConnectionState, ResponseCode, Service};
use crate::ws::codec::{
    Envelope, FrameDecoder, LoginParameters, NotifyEntry, RequestIdentity, SchemaDecoder,
    StreamMessage, SubscriptionParameters,
};
use crate::ws::correlator::RequestCorrelator;
use crate::ws::fields::{default_fields, join_fields};
use crate::ws::observer::{StreamObserver, TracingObserver};
use crate::ws::registry::{Handler, SubscriptionRegistry, panic_reason};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

type WriterHalf = SplitSink<WsStream, Message>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the [`StreamerClient`].
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    /// How long a command may wait for its response.
    pub request_timeout: Duration,
    /// Broadcast capacity of the [`MessageStream`] channel.
    pub message_channel_capacity: usize,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            message_channel_capacity: MESSAGE_CHANNEL_CAPACITY,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for a [`StreamerClient`] with a custom observer, decoder or
/// timeouts.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use schwab_streamer::credentials::StaticCredentials;
/// use schwab_streamer::ws::client::StreamerClientBuilder;
///
/// let streamer = StreamerClientBuilder::new(StaticCredentials::token_only("token"))
///     .request_timeout(Duration::from_secs(10))
///     .message_channel_capacity(1024)
///     .build();
/// ```
pub struct StreamerClientBuilder<P> {
    provider: P,
    config: StreamerConfig,
    observer: Arc<dyn StreamObserver>,
    decoder: Arc<dyn FrameDecoder>,
}

impl<P: StreamerInfoProvider> StreamerClientBuilder<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: StreamerConfig::default(),
            observer: Arc::new(TracingObserver),
            decoder: Arc::new(SchemaDecoder),
        }
    }

    /// Response window for every command. Default: 30 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Capacity of the pull-style message channel. Default: 4,096.
    pub fn message_channel_capacity(mut self, cap: usize) -> Self {
        self.config.message_channel_capacity = cap.max(1);
        self
    }

    /// Receiver of heartbeats, notices and errors. Default: [`TracingObserver`].
    pub fn observer(mut self, observer: impl StreamObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Frame decoder. Default: [`SchemaDecoder`].
    pub fn decoder(mut self, decoder: impl FrameDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    pub fn build(self) -> StreamerClient<P> {
        StreamerClient {
            provider: self.provider,
            lifecycle: tokio::sync::Mutex::new(()),
            shared: Arc::new(Shared {
                state: Mutex::new(ConnectionState::Disconnected),
                session: RwLock::new(None),
                registry: SubscriptionRegistry::new(),
                observer: self.observer,
                decoder: self.decoder,
                config: self.config,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// How a session ended.
enum CloseReason {
    /// `logout()` or `close()`.
    Requested,
    /// The server closed the socket.
    Remote,
    /// The socket failed.
    Failed(String),
}

/// Everything that lives exactly as long as one socket.
struct Session {
    info: StreamerInfo,
    correlator: RequestCorrelator,
    writer: tokio::sync::Mutex<Option<WriterHalf>>,
    messages: Mutex<Option<broadcast::Sender<StreamMessage>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl Session {
    /// Write one text frame. Writers are serialized by the mutex.
    async fn write(&self, frame: String) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(SchwabError::ConnectionClosed)?;
        writer.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    async fn close_writer(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.send(Message::Close(None)).await;
        }
    }

    fn publish(&self, message: StreamMessage) {
        if let Some(tx) = self.messages.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            // No receivers is fine.
            let _ = tx.send(message);
        }
    }

    fn subscribe_messages(&self) -> Option<broadcast::Receiver<StreamMessage>> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(broadcast::Sender::subscribe)
    }

    fn abort_reader(&self) {
        if let Some(task) = self.reader.lock().unwrap_or_else(PoisonError::into_inner).take() {
            task.abort();
        }
    }
}

/// State shared between the client and its receive loop.
struct Shared {
    state: Mutex<ConnectionState>,
    session: RwLock<Option<Arc<Session>>>,
    registry: SubscriptionRegistry,
    observer: Arc<dyn StreamObserver>,
    decoder: Arc<dyn FrameDecoder>,
    config: StreamerConfig,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn current_session(&self) -> Option<Arc<Session>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_current(&self, session: &Arc<Session>) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|s| Arc::ptr_eq(s, session))
    }

    /// Move between states only while `session` is still the live one.
    fn transition(
        &self,
        session: &Arc<Session>,
        from: ConnectionState,
        to: ConnectionState,
    ) -> bool {
        let slot = self.session.read().unwrap_or_else(PoisonError::into_inner);
        if !slot.as_ref().is_some_and(|s| Arc::ptr_eq(s, session)) {
            return false;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return false;
        }
        *state = to;
        true
    }

    /// Route one inbound text frame.
    fn on_inbound_frame(&self, session: &Session, raw: &str) {
        match self.decoder.decode(raw) {
            Ok(Envelope::Response(entries)) => {
                for entry in entries {
                    match entry.request_id {
                        Some(id) => {
                            session.correlator.settle(id, &entry);
                        }
                        None => tracing::warn!(
                            service = %entry.service,
                            command = %entry.command,
                            "Response without request id"
                        ),
                    }
                }
            }
            Ok(Envelope::Data(entries)) => {
                for entry in entries {
                    let message = self.decoder.to_message(entry);
                    self.registry.dispatch(&message);
                    session.publish(message);
                }
            }
            Ok(Envelope::Notify(entries)) => {
                for entry in entries {
                    match entry {
                        NotifyEntry::Heartbeat(hb) => {
                            self.observe("heartbeat", |o| o.on_heartbeat(&hb));
                        }
                        NotifyEntry::Other(notice) => {
                            self.observe("notify", |o| o.on_notify(&notice));
                        }
                    }
                }
            }
            Ok(Envelope::Unclassified(raw)) => {
                self.observe("unhandled", |o| o.on_unhandled(&raw));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to decode streamer frame");
                self.observe("error", |o| o.on_error(&e));
            }
        }
    }

    /// End a session exactly once: detach it, fail its pending commands,
    /// and close the socket.
    async fn teardown(&self, session: &Arc<Session>, reason: CloseReason) {
        if session.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        {
            let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
            if slot.as_ref().is_some_and(|s| Arc::ptr_eq(s, session)) {
                *slot = None;
                self.set_state(ConnectionState::Disconnected);
            }
        }

        match &reason {
            CloseReason::Failed(cause) => {
                tracing::error!(%cause, "Streamer connection failed");
                session
                    .correlator
                    .fail_all(|| SchwabError::Transport(cause.clone()));
                let error = SchwabError::Transport(cause.clone());
                self.observe("error", |o| o.on_error(&error));
            }
            CloseReason::Remote => {
                tracing::info!("Streamer closed the connection");
                session.correlator.fail_all(|| SchwabError::ConnectionClosed);
            }
            CloseReason::Requested => {
                session.correlator.fail_all(|| SchwabError::ConnectionClosed);
            }
        }

        // Ends every MessageStream.
        session
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        session.close_writer().await;
        self.observe("close", |o| o.on_close());
    }

    /// Run one observer callback. A panic is logged and the receive loop
    /// carries on.
    fn observe(&self, callback: &'static str, f: impl FnOnce(&dyn StreamObserver)) {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| f(self.observer.as_ref()))) {
            tracing::error!(
                callback,
                reason = %panic_reason(panic.as_ref()),
                "Stream observer panicked"
            );
        }
    }
}

/// Read frames until the socket ends, then tear the session down.
async fn receive_loop(shared: Arc<Shared>, session: Arc<Session>, mut read: SplitStream<WsStream>) {
    let reason = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => shared.on_inbound_frame(&session, text.as_str()),
            Some(Ok(Message::Binary(data))) => {
                tracing::debug!(len = data.len(), "Ignoring binary frame");
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(?frame, "Close frame received");
                break CloseReason::Remote;
            }
            // Ping/pong handled automatically by tungstenite
            Some(Ok(_)) => {}
            Some(Err(e)) => break CloseReason::Failed(e.to_string()),
            None => break CloseReason::Remote,
        }
    };

    shared.teardown(&session, reason).await;
}

// ---------------------------------------------------------------------------
// Pull-style consumption
// ---------------------------------------------------------------------------

/// Receiver of every data message of one session, in arrival order.
pub struct MessageStream {
    rx: broadcast::Receiver<StreamMessage>,
}

impl MessageStream {
    /// Wait for the next message. Returns `None` once the session has closed
    /// and every buffered message was read.
    ///
    /// A receiver that falls more than the channel capacity behind skips the
    /// oldest messages.
    pub async fn next_message(&mut self) -> Option<StreamMessage> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Message stream lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// StreamerClient
// ---------------------------------------------------------------------------

/// Client for the Schwab streamer. All methods take `&self`; wrap it in an
/// `Arc` to issue commands from several tasks at once.
pub struct StreamerClient<P> {
    provider: P,
    /// Serializes connect / login / logout.
    lifecycle: tokio::sync::Mutex<()>,
    shared: Arc<Shared>,
}

impl<P: StreamerInfoProvider> StreamerClient<P> {
    /// A client with the default configuration.
    pub fn new(provider: P) -> Self {
        StreamerClientBuilder::new(provider).build()
    }

    pub fn builder(provider: P) -> StreamerClientBuilder<P> {
        StreamerClientBuilder::new(provider)
    }

    pub fn config(&self) -> &StreamerConfig {
        &self.shared.config
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// True iff logged in and the socket is open.
    pub fn is_connected(&self) -> bool {
        self.shared.state() == ConnectionState::LoggedIn
            && self
                .shared
                .current_session()
                .is_some_and(|s| !s.closed.load(Ordering::Acquire))
    }

    /// Commands of the current session still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.shared
            .current_session()
            .map_or(0, |s| s.correlator.pending_count())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Open the socket to the streamer URL from the credential provider.
    pub async fn connect(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        let state = self.shared.state();
        if state != ConnectionState::Disconnected {
            return Err(SchwabError::InvalidState(state));
        }

        let info = self.provider.streamer_info().await?;
        let url = url::Url::parse(&info.streamer_socket_url)?;

        self.shared.set_state(ConnectionState::Connecting);
        let ws = match connect_async(url.as_str()).await {
            Ok((ws, _resp)) => ws,
            Err(e) => {
                self.shared.set_state(ConnectionState::Disconnected);
                tracing::error!(%url, error = %e, "Streamer connect failed");
                return Err(e.into());
            }
        };
        let (write, read) = ws.split();

        let (messages, _) = broadcast::channel(self.shared.config.message_channel_capacity);
        let session = Arc::new(Session {
            correlator: RequestCorrelator::new(
                RequestIdentity::from(&info),
                self.shared.config.request_timeout,
            ),
            info,
            writer: tokio::sync::Mutex::new(Some(write)),
            messages: Mutex::new(Some(messages)),
            reader: Mutex::new(None),
            closed: AtomicBool::new(false),
        });

        *self.shared.session.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::clone(&session));
        self.shared.set_state(ConnectionState::Connected);

        let task = tokio::spawn(receive_loop(
            Arc::clone(&self.shared),
            Arc::clone(&session),
            read,
        ));
        *session.reader.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);

        tracing::info!(%url, "Connected to streamer");
        Ok(())
    }

    /// Authenticate the session. A no-op when already logged in.
    pub async fn login(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        match self.shared.state() {
            ConnectionState::LoggedIn => return Ok(()),
            ConnectionState::Connected => {}
            _ => return Err(SchwabError::NotConnected),
        }
        let session = self.shared.current_session().ok_or(SchwabError::NotConnected)?;

        let params = LoginParameters {
            Authorization: self.provider.access_token().await?,
            SchwabClientChannel: session.info.schwab_client_channel.clone(),
            SchwabClientFunctionId: session.info.schwab_client_function_id.clone(),
        };

        match self
            .send_on(&session, Service::ADMIN, Command::LOGIN, Some(serde_json::to_value(params)?))
            .await
        {
            Ok(_) => {
                if !self.shared.transition(
                    &session,
                    ConnectionState::Connected,
                    ConnectionState::LoggedIn,
                ) {
                    return Err(SchwabError::ConnectionClosed);
                }
                tracing::info!("Logged in to streamer");
                Ok(())
            }
            Err(SchwabError::StreamerRejected { code, message }) => {
                tracing::warn!(
                    code,
                    kind = ?ResponseCode::from_code(code),
                    %message,
                    "Streamer login denied"
                );
                Err(SchwabError::LoginDenied { code, message })
            }
            Err(e) => Err(e),
        }
    }

    /// Log out and close the socket. A no-op when not logged in.
    ///
    /// The `LOGOUT` command is best effort: if it fails the session is still
    /// closed locally.
    pub async fn logout(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        if self.shared.state() != ConnectionState::LoggedIn {
            return Ok(());
        }
        let Some(session) = self.shared.current_session() else {
            return Ok(());
        };
        self.shared
            .transition(&session, ConnectionState::LoggedIn, ConnectionState::Closing);

        if let Err(e) = session
            .correlator
            .send(Service::ADMIN.as_str(), Command::LOGOUT, None, |frame| {
                session.write(frame)
            })
            .await
        {
            tracing::warn!(error = %e, "Logout request failed; closing anyway");
        }

        self.shutdown(&session).await;
        tracing::info!("Logged out of streamer");
        Ok(())
    }

    /// Close the socket immediately from any state, without `LOGOUT`.
    /// Every in-flight command fails with [`SchwabError::ConnectionClosed`].
    pub async fn close(&self) {
        if let Some(session) = self.shared.current_session() {
            self.shared
                .transition(&session, self.shared.state(), ConnectionState::Closing);
            self.shutdown(&session).await;
        }
    }

    async fn shutdown(&self, session: &Arc<Session>) {
        self.shared.teardown(session, CloseReason::Requested).await;
        session.abort_reader();
    }

    // -----------------------------------------------------------------------
    // Handlers and messages
    // -----------------------------------------------------------------------

    /// Register `handler` for a service. Handlers run on the receive loop in
    /// registration order and must not block.
    pub fn add_handler(&self, service: Service, handler: Handler) {
        self.shared.registry.add_handler(service.as_str(), handler);
    }

    /// Register a closure and return the handle needed to remove it.
    pub fn on_data<F>(&self, service: Service, f: F) -> Handler
    where
        F: Fn(&StreamMessage) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(f);
        self.add_handler(service, Arc::clone(&handler));
        handler
    }

    pub fn remove_handler(&self, service: Service, handler: &Handler) -> bool {
        self.shared.registry.remove_handler(service.as_str(), handler)
    }

    pub fn clear_handlers(&self, service: Service) {
        self.shared.registry.clear_handlers(service.as_str());
    }

    pub fn clear_all_handlers(&self) {
        self.shared.registry.clear_all();
    }

    /// Pull-style access to the current session's data messages.
    pub fn messages(&self) -> Result<MessageStream> {
        self.shared
            .current_session()
            .and_then(|s| s.subscribe_messages())
            .map(|rx| MessageStream { rx })
            .ok_or(SchwabError::NotConnected)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Subscribe to `keys`, replacing the service's current key set.
    /// `None` fields select the service default list.
    pub async fn subscribe<S: AsRef<str>>(
        &self,
        service: Service,
        keys: &[S],
        fields: Option<&[u32]>,
    ) -> Result<()> {
        self.subscription_command(service, Command::SUBS, Some(join_keys(keys)), fields)
            .await
    }

    /// Remove `keys` from the service's subscription. Handlers stay
    /// registered.
    pub async fn unsubscribe<S: AsRef<str>>(&self, service: Service, keys: &[S]) -> Result<()> {
        self.subscription_command(service, Command::UNSUBS, Some(join_keys(keys)), None)
            .await
    }

    /// Add `keys` to the service's existing subscription.
    pub async fn add<S: AsRef<str>>(
        &self,
        service: Service,
        keys: &[S],
        fields: Option<&[u32]>,
    ) -> Result<()> {
        self.subscription_command(service, Command::ADD, Some(join_keys(keys)), fields)
            .await
    }

    /// Change the field set streamed for every key of the service.
    pub async fn view(&self, service: Service, fields: Option<&[u32]>) -> Result<()> {
        self.subscription_command(service, Command::VIEW, None, fields)
            .await
    }

    /// `SUBS` on `ACCT_ACTIVITY` for every account of the login.
    pub async fn account_activity_subs(&self) -> Result<()> {
        self.subscribe(Service::ACCT_ACTIVITY, &[ACCOUNT_ACTIVITY_KEY], None)
            .await
    }

    /// `UNSUBS` on `ACCT_ACTIVITY`.
    pub async fn account_activity_unsubs(&self) -> Result<()> {
        self.unsubscribe(Service::ACCT_ACTIVITY, &[ACCOUNT_ACTIVITY_KEY])
            .await
    }

    /// Send an arbitrary command on a logged-in session and return the
    /// response content.
    pub async fn send_command(
        &self,
        service: Service,
        command: Command,
        parameters: Option<Value>,
    ) -> Result<Value> {
        let session = self.logged_in_session()?;
        self.send_on(&session, service, command, parameters).await
    }

    async fn subscription_command(
        &self,
        service: Service,
        command: Command,
        keys: Option<String>,
        fields: Option<&[u32]>,
    ) -> Result<()> {
        let session = self.logged_in_session()?;

        if service == Service::ADMIN {
            return Err(SchwabError::InvalidArgument(
                "ADMIN does not take subscription commands".into(),
            ));
        }
        if command == Command::VIEW && !service.supports_view() {
            return Err(SchwabError::InvalidArgument(format!(
                "{service} does not support VIEW"
            )));
        }
        if keys.as_deref() == Some("") {
            return Err(SchwabError::InvalidArgument(
                "at least one key is required".into(),
            ));
        }

        let fields = match command {
            Command::UNSUBS => None,
            _ => Some(join_fields(fields.unwrap_or(default_fields(service)))),
        };
        let params = SubscriptionParameters { keys, fields };

        tracing::debug!(
            %service,
            %command,
            keys = params.keys.as_deref().unwrap_or_default(),
            fields = params.fields.as_deref().unwrap_or_default(),
            "Subscription command"
        );

        self.send_on(&session, service, command, Some(serde_json::to_value(&params)?))
            .await
            .map(|_| ())
    }

    fn logged_in_session(&self) -> Result<Arc<Session>> {
        if self.shared.state() != ConnectionState::LoggedIn {
            return Err(SchwabError::NotLoggedIn);
        }
        self.shared.current_session().ok_or(SchwabError::NotLoggedIn)
    }

    /// Send through the session's correlator; a transport failure ends the
    /// session.
    async fn send_on(
        &self,
        session: &Arc<Session>,
        service: Service,
        command: Command,
        parameters: Option<Value>,
    ) -> Result<Value> {
        let result = session
            .correlator
            .send(service.as_str(), command, parameters, |frame| session.write(frame))
            .await;

        if let Err(e) = &result {
            if matches!(e, SchwabError::WebSocket(_)) && self.shared.is_current(session) {
                self.shared
                    .teardown(session, CloseReason::Failed(e.to_string()))
                    .await;
                session.abort_reader();
            }
        }
        result
    }
}

impl<P> Drop for StreamerClient<P> {
    fn drop(&mut self) {
        let session = self
            .shared
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = session {
            session.correlator.fail_all(|| SchwabError::ConnectionClosed);
            session.abort_reader();
        }
    }
}

fn join_keys<S: AsRef<str>>(keys: &[S]) -> String {
    keys.iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

// ---------------------------------------------------------------------------
// Per-service commands
// ---------------------------------------------------------------------------

macro_rules! service_commands {
    ($($service:ident => $subs:ident, $unsubs:ident, $add:ident, $view:ident;)*) => {
        impl<P: StreamerInfoProvider> StreamerClient<P> {
            $(
                #[doc = concat!("`SUBS` on `", stringify!($service), "`.")]
                pub async fn $subs<S: AsRef<str>>(
                    &self,
                    keys: &[S],
                    fields: Option<&[u32]>,
                ) -> Result<()> {
                    self.subscribe(Service::$service, keys, fields).await
                }

                #[doc = concat!("`UNSUBS` on `", stringify!($service), "`.")]
                pub async fn $unsubs<S: AsRef<str>>(&self, keys: &[S]) -> Result<()> {
                    self.unsubscribe(Service::$service, keys).await
                }

                #[doc = concat!("`ADD` on `", stringify!($service), "`.")]
                pub async fn $add<S: AsRef<str>>(
                    &self,
                    keys: &[S],
                    fields: Option<&[u32]>,
                ) -> Result<()> {
                    self.add(Service::$service, keys, fields).await
                }

                #[doc = concat!("`VIEW` on `", stringify!($service), "`.")]
                pub async fn $view(&self, fields: Option<&[u32]>) -> Result<()> {
                    self.view(Service::$service, fields).await
                }
            )*
        }
    };
}

service_commands! {
    LEVELONE_EQUITIES =>
        level_one_equities_subs,
        level_one_equities_unsubs,
        level_one_equities_add,
        level_one_equities_view;
    LEVELONE_OPTIONS =>
        level_one_options_subs,
        level_one_options_unsubs,
        level_one_options_add,
        level_one_options_view;
    LEVELONE_FUTURES =>
        level_one_futures_subs,
        level_one_futures_unsubs,
        level_one_futures_add,
        level_one_futures_view;
    LEVELONE_FUTURES_OPTIONS =>
        level_one_futures_options_subs,
        level_one_futures_options_unsubs,
        level_one_futures_options_add,
        level_one_futures_options_view;
    LEVELONE_FOREX =>
        level_one_forex_subs,
        level_one_forex_unsubs,
        level_one_forex_add,
        level_one_forex_view;
    NYSE_BOOK =>
        nyse_book_subs,
        nyse_book_unsubs,
        nyse_book_add,
        nyse_book_view;
    NASDAQ_BOOK =>
        nasdaq_book_subs,
        nasdaq_book_unsubs,
        nasdaq_book_add,
        nasdaq_book_view;
    OPTIONS_BOOK =>
        options_book_subs,
        options_book_unsubs,
        options_book_add,
        options_book_view;
    CHART_EQUITY =>
        chart_equity_subs,
        chart_equity_unsubs,
        chart_equity_add,
        chart_equity_view;
    CHART_FUTURES =>
        chart_futures_subs,
        chart_futures_unsubs,
        chart_futures_add,
        chart_futures_view;
    SCREENER_EQUITY =>
        screener_equity_subs,
        screener_equity_unsubs,
        screener_equity_add,
        screener_equity_view;
    SCREENER_OPTION =>
        screener_option_subs,
        screener_option_unsubs,
        screener_option_add,
        screener_option_view;
}
