//! The shared ServerQuery connection.
//!
//! A [`QueryConnection`] owns one text stream. Every command goes through
//! [`QueryConnection::send`], which holds an exclusive lock across "write
//! the command, read one frame". The stream carries no request ids, so this
//! lock ordering is the only thing pairing a response with its command.
//! `tokio::sync::Mutex` wakes waiters in FIFO order.
//!
//! Pushes that arrive with a response are copied into per-connection buffers
//! before the lock is released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

use ts3query_protocol::{Command, Event, FrameReader, FrameWriter, GREETING, Message, Response};

use crate::buffer::{PushBuffer, Received};
use crate::commands::Commands;
use crate::error::{ClientError, ClientResult};
use crate::options::ConnectionOptions;
use crate::poller::Poller;

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No stream attached.
    Disconnected,
    /// Stream attached, not authenticated.
    Connected,
    /// Authenticated with `login`.
    LoggedIn,
}

/// Query account credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

struct Transport<S> {
    reader: FrameReader<ReadHalf<S>>,
    writer: FrameWriter<WriteHalf<S>>,
    /// A command was written but its response was never read.
    pending: bool,
}

pub(crate) struct Inner<S> {
    transport: tokio::sync::Mutex<Option<Transport<S>>>,
    state: Mutex<ConnectionState>,
    options: Mutex<ConnectionOptions>,
    events: Mutex<PushBuffer<Event>>,
    messages: Mutex<PushBuffer<Message>>,
    poller: Mutex<Option<Poller>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a shared ServerQuery connection.
///
/// Cloning is cheap; all clones use the same stream, buffers and poller.
pub struct QueryConnection<S = TcpStream> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for QueryConnection<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for QueryConnection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryConnection")
            .field("state", &*lock(&self.inner.state))
            .finish_non_exhaustive()
    }
}

impl QueryConnection<TcpStream> {
    /// Opens a TCP connection and skips the greeting.
    pub async fn connect(&self, host: &str, port: u16) -> ClientResult<()> {
        let timeout = self.options().timeout;
        let addr = format!("{host}:{port}");
        info!(%addr, "connecting to server");

        let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| {
                ClientError::Connection(format!(
                    "connection to {} timed out after {}s",
                    addr,
                    timeout.as_secs()
                ))
            })?
            .map_err(|e| ClientError::Connection(format!("failed to connect to {}: {}", addr, e)))?;

        self.open(stream).await
    }

    /// Connects, then logs in when credentials are given.
    ///
    /// A rejected login is returned as the response; it does not fail the
    /// call.
    pub async fn establish(
        host: &str,
        port: u16,
        credentials: Option<&Credentials>,
        options: ConnectionOptions,
    ) -> ClientResult<(Self, Option<Response>)> {
        let connection = Self::new(options);
        connection.connect(host, port).await?;

        let login = match credentials {
            Some(credentials) => Some(
                connection
                    .login(&credentials.login, &credentials.password)
                    .await?,
            ),
            None => {
                info!("no credentials provided, not logging in");
                None
            }
        };
        Ok((connection, login))
    }
}

impl<S> QueryConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Creates a disconnected instance.
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport: tokio::sync::Mutex::new(None),
                state: Mutex::new(ConnectionState::Disconnected),
                events: Mutex::new(PushBuffer::new("events", options.events_limit)),
                messages: Mutex::new(PushBuffer::new("messages", options.messages_limit)),
                options: Mutex::new(options),
                poller: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner<S>> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<Inner<S>>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    /// Attaches a stream and reads the greeting banner.
    pub async fn open(&self, stream: S) -> ClientResult<()> {
        self.install(stream, true).await
    }

    /// Attaches a stream whose greeting was already consumed.
    pub async fn attach(&self, stream: S) -> ClientResult<()> {
        self.install(stream, false).await
    }

    async fn install(&self, stream: S, read_greeting: bool) -> ClientResult<()> {
        let mut guard = self.inner.transport.lock().await;
        if guard.is_some() {
            return Err(ClientError::AlreadyConnected);
        }

        let (read, write) = tokio::io::split(stream);
        let mut reader = FrameReader::new(read);

        if read_greeting {
            let timeout = self.options().timeout;
            debug!("skipping greeting");
            reader
                .read_until_timeout(GREETING, timeout)
                .await
                .map_err(|e| ClientError::Connection(format!("no greeting received: {}", e)))?;
        }

        *guard = Some(Transport {
            reader,
            writer: FrameWriter::new(write),
            pending: false,
        });
        self.set_state(ConnectionState::Connected);
        info!("connected");
        Ok(())
    }

    /// Sends a command and waits for its response.
    ///
    /// A non-zero error id is returned as data. Transport failures and
    /// timeouts are errors; a closed stream also detaches the connection.
    pub async fn send(&self, command: &Command) -> ClientResult<Response> {
        let verb = command.verb();
        trace!(command = %verb, "acquiring connection lock");
        let mut guard = self.inner.transport.lock().await;
        trace!(command = %verb, "connection lock acquired");

        let Some(transport) = guard.as_mut() else {
            return Err(ClientError::NotConnected);
        };
        let options = self.options();

        let result = self.exchange(transport, command, &options).await;
        if result.as_ref().is_err_and(ClientError::is_stream_failure) {
            warn!(command = %verb, "stream failed, detaching connection");
            *guard = None;
            self.set_state(ConnectionState::Disconnected);
        }

        drop(guard);
        trace!(command = %verb, "connection lock released");
        result
    }

    async fn exchange(
        &self,
        transport: &mut Transport<S>,
        command: &Command,
        options: &ConnectionOptions,
    ) -> ClientResult<Response> {
        if transport.pending {
            self.drain_pending(transport, options.timeout).await?;
        }

        if options.flood_protection {
            tokio::time::sleep(options.flood_interval).await;
        }

        debug!(command = %command.verb(), "sending command");
        transport.pending = true;
        transport.writer.write_command(command).await?;
        let frame = transport.reader.read_frame_timeout(options.timeout).await?;
        transport.pending = false;

        let response = Response::from_raw(&frame);
        debug!(
            command = %command.verb(),
            size = frame.len(),
            error_id = response.error_id,
            records = response.data.len(),
            events = response.events.len(),
            messages = response.messages.len(),
            "received response"
        );
        self.store(&response);
        Ok(response)
    }

    /// Reads the response of an abandoned command so the next command gets
    /// its own. Nothing is written until that response arrives.
    async fn drain_pending(&self, transport: &mut Transport<S>, timeout: Duration) -> ClientResult<()> {
        debug!("draining response of an abandoned command");
        match transport.reader.read_frame_timeout(timeout).await {
            Ok(frame) => {
                self.store(&Response::from_raw(&frame));
                transport.pending = false;
                Ok(())
            }
            Err(err) => {
                if err.is_timeout() {
                    warn!("abandoned command still unanswered, command not sent");
                }
                Err(err.into())
            }
        }
    }

    fn store(&self, response: &Response) {
        lock(&self.inner.events).extend(response.events.iter().cloned());
        lock(&self.inner.messages).extend(response.messages.iter().cloned());
    }

    /// Authenticates. The state only changes when the server accepts.
    pub async fn login(&self, login: &str, password: &str) -> ClientResult<Response> {
        info!(login, "logging in");
        let response = self.commands().login(login, password).await?;
        if response.is_ok() {
            self.set_state(ConnectionState::LoggedIn);
        } else {
            warn!(error_id = response.error_id, error = %response.error_message, "login rejected");
        }
        Ok(response)
    }

    pub async fn logout(&self) -> ClientResult<Response> {
        info!("logging out");
        let response = self.commands().logout().await?;
        if response.is_ok() {
            self.set_state(ConnectionState::Connected);
        }
        Ok(response)
    }

    /// Starts the keepalive poller. A running poller is left alone.
    pub fn start_polling(&self, rate: Duration) -> ClientResult<()> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }

        let mut poller = lock(&self.inner.poller);
        if poller.as_ref().is_some_and(|p| !p.is_finished()) {
            debug!("poller already running");
            return Ok(());
        }

        info!(rate_ms = rate.as_millis() as u64, "starting poller");
        *poller = Some(Poller::spawn(self.downgrade(), rate));
        Ok(())
    }

    /// Stops the poller and waits up to `poll_join_timeout` for it.
    ///
    /// Does nothing when no poller runs.
    pub async fn stop_polling(&self) -> ClientResult<()> {
        let Some(poller) = lock(&self.inner.poller).take() else {
            debug!("poller not running");
            return Ok(());
        };

        info!("stopping poller");
        let join_timeout = self.options().poll_join_timeout;
        poller.stop(join_timeout).await
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.inner.poller)
            .as_ref()
            .is_some_and(|p| !p.is_finished())
    }

    /// Stops polling, quits and closes the stream.
    ///
    /// Safe to call repeatedly and on a connection that never connected.
    pub async fn disconnect(&self) -> ClientResult<()> {
        if let Err(err) = self.stop_polling().await {
            warn!(error = %err, "poller did not stop cleanly");
        }

        if !self.is_connected() {
            debug!("already disconnected");
            return Ok(());
        }

        info!("disconnecting");
        if let Err(err) = self.commands().quit().await {
            warn!(error = %err, "quit failed");
        }

        if let Some(mut transport) = self.inner.transport.lock().await.take() {
            if let Err(err) = transport.writer.shutdown().await {
                debug!(error = %err, "shutdown after quit failed");
            }
        }
        self.set_state(ConnectionState::Disconnected);
        info!("connection closed");
        Ok(())
    }

    /// Command surface bound to this connection.
    pub fn commands(&self) -> Commands<'_, S> {
        Commands::new(self)
    }
}

impl<S> QueryConnection<S> {
    pub fn state(&self) -> ConnectionState {
        *lock(&self.inner.state)
    }

    fn set_state(&self, state: ConnectionState) {
        let mut current = lock(&self.inner.state);
        if *current != state {
            debug!(from = ?*current, to = ?state, "connection state changed");
            *current = state;
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() != ConnectionState::Disconnected
    }

    pub fn is_logged_in(&self) -> bool {
        self.state() == ConnectionState::LoggedIn
    }

    /// Current options.
    pub fn options(&self) -> ConnectionOptions {
        lock(&self.inner.options).clone()
    }

    pub fn flood_protection(&self) -> bool {
        lock(&self.inner.options).flood_protection
    }

    pub fn enable_flood_protection(&self) {
        info!("enabling flood protection");
        lock(&self.inner.options).flood_protection = true;
    }

    pub fn disable_flood_protection(&self) {
        info!("disabling flood protection");
        lock(&self.inner.options).flood_protection = false;
    }

    pub fn set_flood_interval(&self, interval: Duration) {
        info!(interval_ms = interval.as_millis() as u64, "setting flood interval");
        lock(&self.inner.options).flood_interval = interval;
    }

    pub fn set_timeout(&self, timeout: Duration) {
        lock(&self.inner.options).timeout = timeout;
    }

    pub fn events_limit(&self) -> usize {
        lock(&self.inner.events).limit()
    }

    pub fn set_events_limit(&self, limit: usize) {
        info!(limit, "setting events limit");
        lock(&self.inner.options).events_limit = limit;
        lock(&self.inner.events).set_limit(limit);
    }

    pub fn messages_limit(&self) -> usize {
        lock(&self.inner.messages).limit()
    }

    pub fn set_messages_limit(&self, limit: usize) {
        info!(limit, "setting messages limit");
        lock(&self.inner.options).messages_limit = limit;
        lock(&self.inner.messages).set_limit(limit);
    }

    /// Snapshot of all buffered events, oldest first.
    pub fn events(&self) -> Vec<Arc<Received<Event>>> {
        lock(&self.inner.events).snapshot()
    }

    /// Snapshot of buffered events not yet marked used.
    pub fn unread_events(&self) -> Vec<Arc<Received<Event>>> {
        lock(&self.inner.events).unread()
    }

    /// Snapshot of all buffered messages, oldest first.
    pub fn messages(&self) -> Vec<Arc<Received<Message>>> {
        lock(&self.inner.messages).snapshot()
    }

    /// Snapshot of buffered messages not yet marked used.
    pub fn unread_messages(&self) -> Vec<Arc<Received<Message>>> {
        lock(&self.inner.messages).unread()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::DuplexStream;
    use ts3query_core::EventType;

    use super::*;
    use crate::test_support::{FakeServer, RunningServer, error, ok, push};

    fn options() -> ConnectionOptions {
        ConnectionOptions::default()
            .with_flood_protection(false)
            .with_timeout(Duration::from_millis(500))
    }

    async fn connect(server: FakeServer, options: ConnectionOptions) -> (QueryConnection<DuplexStream>, RunningServer) {
        let (stream, server) = server.start();
        let connection = QueryConnection::new(options);
        connection.open(stream).await.unwrap();
        (connection, server)
    }

    fn answer_version(line: &str) -> Option<String> {
        match line {
            "version" => Some(ok("version=3.13.7 build=1655727713 platform=Linux")),
            _ => Some(ok("")),
        }
    }

    #[tokio::test]
    async fn open_skips_greeting_and_sends() {
        let (connection, server) = connect(FakeServer::new(answer_version), options()).await;
        assert_eq!(connection.state(), ConnectionState::Connected);

        let response = connection.commands().version().await.unwrap();
        assert!(response.is_ok());
        assert_eq!(
            response.first().and_then(|r| r.get_string("version")).as_deref(),
            Some("3.13.7")
        );
        assert_eq!(server.received(), ["version"]);
    }

    #[tokio::test]
    async fn rejected_login_is_data() {
        let handler = |line: &str| {
            if line.starts_with("login ") {
                Some(error(520, "invalid\\sloginname\\sor\\spassword"))
            } else {
                Some(ok(""))
            }
        };
        let (connection, _server) = connect(FakeServer::new(handler), options()).await;

        let response = connection.login("serveradmin", "wrong").await.unwrap();
        assert_eq!(response.error_id, 520);
        assert_eq!(response.error_message, "invalid loginname or password");
        assert_eq!(connection.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn login_and_logout_track_state() {
        let (connection, server) = connect(FakeServer::new(|_| Some(ok(""))), options()).await;

        connection.login("serveradmin", "secret").await.unwrap();
        assert!(connection.is_logged_in());

        connection.logout().await.unwrap();
        assert_eq!(connection.state(), ConnectionState::Connected);
        assert_eq!(
            server.received(),
            [
                "login client_login_name=serveradmin client_login_password=secret",
                "logout"
            ]
        );
    }

    #[tokio::test]
    async fn send_without_stream() {
        let connection: QueryConnection<DuplexStream> = QueryConnection::new(options());
        let err = connection.send(&Command::new("version")).await.unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
    }

    #[tokio::test]
    async fn second_attach_is_rejected() {
        let (connection, _server) = connect(FakeServer::new(answer_version), options()).await;
        let (other, _other_server) = FakeServer::new(answer_version).start();
        let err = connection.attach(other).await.unwrap_err();
        assert!(matches!(err, ClientError::AlreadyConnected));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_greeting_fails_open() {
        let (stream, _server) = FakeServer::new(answer_version).without_greeting().start();
        let connection = QueryConnection::new(options());

        let err = connection.open(stream).await.unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)));
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(matches!(
            connection.send(&Command::new("version")).await,
            Err(ClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn pushes_land_in_buffers() {
        let handler = |_: &str| {
            Some(format!(
                "{}{}{}",
                push("notifytextmessage targetmode=1 msg=!help target=1 invokerid=5 invokername=Bob invokeruid=b"),
                push("notifycliententerview cfid=0 ctid=1 reasonid=0 clid=8 client_nickname=Al client_type=0"),
                ok("")
            ))
        };
        let (connection, _server) = connect(FakeServer::new(handler), options()).await;

        let response = connection.commands().version().await.unwrap();
        assert_eq!(response.events.len(), 1);
        assert_eq!(response.messages.len(), 1);
        assert!(response.data.is_empty());

        let events = connection.unread_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), Some(EventType::ClientEnterView));

        let messages = connection.unread_messages();
        assert_eq!(messages[0].content, "!help");
        messages[0].mark_used();
        assert!(connection.unread_messages().is_empty());
        assert_eq!(connection.messages().len(), 1);

        // The next round trip prunes the used message and appends new pushes.
        connection.commands().version().await.unwrap();
        assert_eq!(connection.messages().len(), 1);
        assert_eq!(connection.unread_messages().len(), 1);
        assert_eq!(connection.events().len(), 2);
    }

    #[tokio::test]
    async fn event_buffer_evicts_oldest() {
        let handler = |_: &str| {
            let pushes: String = (0..5)
                .map(|clid| push(&format!("notifyclientmoved ctid=1 reasonid=0 clid={clid}")))
                .collect();
            Some(format!("{pushes}{}", ok("")))
        };
        let (connection, _server) = connect(
            FakeServer::new(handler),
            options().with_events_limit(3),
        )
        .await;

        connection.commands().version().await.unwrap();
        let clids: Vec<i64> = connection
            .events()
            .iter()
            .filter_map(|event| match event.item() {
                Event::ClientMoved(moved) => moved.clid,
                _ => None,
            })
            .collect();
        assert_eq!(clids, [2, 3, 4]);

        connection.set_events_limit(1);
        assert_eq!(connection.events().len(), 1);
        assert_eq!(connection.events_limit(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sends_get_their_own_response() {
        let handler = |line: &str| {
            let n = line.strip_prefix("echo n=")?;
            Some(ok(&format!("n={n} tail=response\\sfor\\s{n}")))
        };
        let (connection, server) = connect(
            FakeServer::new(handler).with_delay(Duration::from_millis(2)),
            options().with_timeout(Duration::from_secs(5)),
        )
        .await;

        let tasks: Vec<_> = (0..16)
            .map(|n| {
                let connection = connection.clone();
                tokio::spawn(async move {
                    let command = Command::builder("echo").arg("n", n).build();
                    (n, connection.send(&command).await)
                })
            })
            .collect();

        for task in tasks {
            let (n, response) = task.await.unwrap();
            let response = response.unwrap();
            assert_eq!(response.data.len(), 1);
            let record = &response.data[0];
            assert_eq!(record.get_int("n"), Some(n));
            assert_eq!(
                record.get_string("tail"),
                Some(format!("response for {n}"))
            );
        }
        assert_eq!(server.received().len(), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn flood_protection_delays_each_command() {
        let (connection, _server) = connect(
            FakeServer::new(answer_version),
            options().with_flood_protection(true),
        )
        .await;
        assert!(connection.flood_protection());

        let start = tokio::time::Instant::now();
        connection.commands().version().await.unwrap();
        connection.commands().version().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1000));

        connection.disable_flood_protection();
        let start = tokio::time::Instant::now();
        connection.commands().version().await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_command_blocks_later_writes() {
        let handler = |line: &str| match line {
            "stall" => None,
            other => answer_version(other),
        };
        let (connection, server) = connect(FakeServer::new(handler), options()).await;

        let err = connection.send(&Command::new("stall")).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));

        let err = connection.commands().version().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
        assert!(connection.is_connected());
        assert_eq!(server.received(), ["stall"]);
    }

    #[tokio::test(start_paused = true)]
    async fn late_answer_goes_to_nobody_else() {
        let handler = |line: &str| {
            let tag = line.strip_prefix("tag id=")?;
            Some(ok(&format!("id={tag}")))
        };
        let (connection, server) = connect(
            FakeServer::new(handler).with_delay(Duration::from_millis(1200)),
            options(),
        )
        .await;
        let tag = |id: i64| Command::builder("tag").arg("id", id).build();

        let first = connection.send(&tag(1)).await.unwrap_err();
        assert!(matches!(first, ClientError::Timeout(_)));

        // The answer to tag 1 is still 700ms out.
        let second = connection.send(&tag(2)).await.unwrap_err();
        assert!(matches!(second, ClientError::Timeout(_)));
        assert_eq!(server.received(), ["tag id=1"]);

        connection.set_timeout(Duration::from_secs(2));
        let third = connection.send(&tag(3)).await.unwrap();
        assert_eq!(third.first().and_then(|r| r.get_int("id")), Some(3));
        assert_eq!(server.received(), ["tag id=1", "tag id=3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_send_is_drained() {
        let handler = |line: &str| {
            let tag = line.strip_prefix("tag id=")?;
            Some(ok(&format!("id={tag}")))
        };
        let (connection, _server) = connect(
            FakeServer::new(handler).with_delay(Duration::from_millis(50)),
            options(),
        )
        .await;

        let first = Command::builder("tag").arg("id", 1).build();
        let abandoned = tokio::time::timeout(Duration::from_millis(10), connection.send(&first)).await;
        assert!(abandoned.is_err());

        let second = Command::builder("tag").arg("id", 2).build();
        let response = connection.send(&second).await.unwrap();
        assert_eq!(response.first().and_then(|r| r.get_int("id")), Some(2));
    }

    #[tokio::test]
    async fn closed_stream_detaches() {
        let (connection, server) = connect(FakeServer::new(answer_version), options()).await;
        server.abort();
        tokio::task::yield_now().await;

        let err = connection.commands().version().await.unwrap_err();
        assert!(err.is_stream_failure(), "unexpected error: {err}");
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_sends_keepalives_until_stopped() {
        let (connection, server) = connect(FakeServer::new(answer_version), options()).await;

        connection.start_polling(Duration::from_millis(100)).unwrap();
        connection.start_polling(Duration::from_millis(100)).unwrap();
        assert!(connection.is_polling());

        tokio::time::sleep(Duration::from_millis(350)).await;
        connection.stop_polling().await.unwrap();
        assert!(!connection.is_polling());

        let polls = server.received().iter().filter(|line| *line == "version").count();
        assert!((3..=5).contains(&polls), "polls: {polls}");

        connection.stop_polling().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let after = server.received().iter().filter(|line| *line == "version").count();
        assert_eq!(after, polls);
    }

    #[tokio::test]
    async fn polling_requires_connection() {
        let connection: QueryConnection<DuplexStream> = QueryConnection::new(options());
        assert!(matches!(
            connection.start_polling(Duration::from_secs(1)),
            Err(ClientError::NotConnected)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_is_idempotent() {
        let (connection, server) = connect(FakeServer::new(answer_version), options()).await;
        connection.start_polling(Duration::from_millis(100)).unwrap();

        connection.disconnect().await.unwrap();
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(!connection.is_polling());
        assert_eq!(server.received().last().map(String::as_str), Some("quit"));

        connection.disconnect().await.unwrap();

        let never: QueryConnection<DuplexStream> = QueryConnection::new(options());
        never.disconnect().await.unwrap();
    }
}
