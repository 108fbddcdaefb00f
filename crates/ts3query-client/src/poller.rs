//! Background keepalive.
//!
//! The poller sends `version` every `rate` so pushes keep flowing into the
//! buffers between caller commands. It holds only a weak reference to the
//! connection and exits when the last handle is dropped.

use std::sync::Weak;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use ts3query_protocol::Command;

use crate::connection::{Inner, QueryConnection};
use crate::error::{ClientError, ClientResult};

pub(crate) struct Poller {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Poller {
    pub(crate) fn spawn<S>(connection: Weak<Inner<S>>, rate: Duration) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(connection, rate, cancel.clone()));
        Self { cancel, task }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the task and waits for it, aborting after `join_timeout`.
    pub(crate) async fn stop(self, join_timeout: Duration) -> ClientResult<()> {
        self.cancel.cancel();
        let abort = self.task.abort_handle();

        match tokio::time::timeout(join_timeout, self.task).await {
            Ok(Ok(())) => {
                debug!("poller joined");
                Ok(())
            }
            Ok(Err(err)) => {
                warn!(error = %err, "poller task failed");
                Ok(())
            }
            Err(_) => {
                warn!(
                    timeout_ms = join_timeout.as_millis() as u64,
                    "poller did not stop in time, aborting"
                );
                abort.abort();
                Err(ClientError::PollerStalled(join_timeout))
            }
        }
    }
}

async fn run<S>(connection: Weak<Inner<S>>, rate: Duration, cancel: CancellationToken)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let keepalive = Command::new("version");
    debug!("poller started");

    loop {
        let Some(conn) = QueryConnection::upgrade(&connection) else {
            debug!("connection dropped, poller exiting");
            break;
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = conn.send(&keepalive) => result,
        };
        drop(conn);

        match result {
            Ok(_) => trace!("keepalive sent"),
            Err(ClientError::NotConnected) => {
                debug!("connection closed, poller exiting");
                break;
            }
            Err(err) => warn!(error = %err, "keepalive failed"),
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(rate) => {}
        }
    }

    debug!("poller stopped");
}
