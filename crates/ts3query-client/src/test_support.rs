//! In-memory ServerQuery server for tests.
//!
//! The server writes the greeting, then answers each command line with
//! whatever the handler returns. Replies are raw protocol text, so a handler
//! can put pushes in front of the terminator.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

use ts3query_protocol::GREETING;

type Handler = Box<dyn FnMut(&str) -> Option<String> + Send>;

/// Scripted server, configured before [`start`](Self::start).
pub struct FakeServer {
    handler: Handler,
    greeting: bool,
    delay: Duration,
    hang_up_on: Option<String>,
}

impl FakeServer {
    /// `handler` gets each command line without its `\n`. `None` sends
    /// nothing back.
    pub fn new(handler: impl FnMut(&str) -> Option<String> + Send + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            greeting: true,
            delay: Duration::ZERO,
            hang_up_on: None,
        }
    }

    /// Skips the greeting banner.
    pub fn without_greeting(mut self) -> Self {
        self.greeting = false;
        self
    }

    /// Waits `delay` before answering each command.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Closes the stream, without answering, on the first command line
    /// starting with `prefix`.
    pub fn hang_up_on(mut self, prefix: impl Into<String>) -> Self {
        self.hang_up_on = Some(prefix.into());
        self
    }

    /// Spawns the server and returns the client end of the stream.
    pub fn start(self) -> (DuplexStream, RunningServer) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let received = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn(serve(server, self, Arc::clone(&received)));
        (client, RunningServer { received, task })
    }
}

async fn serve(stream: DuplexStream, mut config: FakeServer, received: Arc<Mutex<Vec<String>>>) {
    let (read, mut write) = tokio::io::split(stream);
    if config.greeting && write.write_all(GREETING).await.is_err() {
        return;
    }

    let mut lines = BufReader::new(read).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.clone());
        if config.hang_up_on.as_deref().is_some_and(|prefix| line.starts_with(prefix)) {
            return;
        }

        if !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
        if let Some(reply) = (config.handler)(&line) {
            if write.write_all(reply.as_bytes()).await.is_err() {
                return;
            }
        }
        if line == "quit" {
            return;
        }
    }
}

/// Handle to a started [`FakeServer`].
pub struct RunningServer {
    received: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl RunningServer {
    /// Command lines seen so far.
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns true once the server closed its end.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Drops the server end of the stream.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// A successful reply carrying `body` as data.
pub fn ok(body: &str) -> String {
    if body.is_empty() {
        "error id=0 msg=ok\n\r".to_string()
    } else {
        format!("{body}\n\r{}", ok(""))
    }
}

/// A rejected reply. `msg` must already be escaped.
pub fn error(id: u32, msg: &str) -> String {
    format!("error id={id} msg={msg}\n\r")
}

/// A push line.
pub fn push(line: &str) -> String {
    format!("{line}\n\r")
}
