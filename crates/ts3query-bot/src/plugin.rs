//! Plugin trait and the context each plugin runs with.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use ts3query_client::Ts3Client;

use crate::error::{BotError, BotResult};
use crate::signals::ShutdownHandle;

/// Result type for plugin runs.
pub type PluginResult<T> = BotResult<T>;

/// Byte streams a plugin's client can run over.
pub trait QueryStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> QueryStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// A long-running bot behavior.
///
/// `run` should loop until [`PluginContext::is_shutdown`] and use
/// [`PluginContext::sleep`] between ticks so that stopping is prompt.
pub trait Plugin<S = TcpStream>: Send + 'static {
    fn name(&self) -> &'static str;

    fn run(self: Box<Self>, ctx: PluginContext<S>) -> BoxFuture<'static, PluginResult<()>>;
}

/// What a running plugin gets: the shared client and the shutdown flag.
pub struct PluginContext<S = TcpStream> {
    client: Ts3Client<S>,
    shutdown: ShutdownHandle,
}

impl<S> Clone for PluginContext<S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S: QueryStream> PluginContext<S> {
    pub fn new(client: Ts3Client<S>, shutdown: ShutdownHandle) -> Self {
        Self { client, shutdown }
    }

    pub fn client(&self) -> &Ts3Client<S> {
        &self.client
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_shutdown()
    }

    /// Sleeps between ticks. Returns false once shutdown was requested.
    pub async fn sleep(&self, interval: Duration) -> bool {
        self.shutdown.sleep(interval).await
    }
}

/// Splits a tick error into one to log and continue on, or one that ends
/// the plugin because the session is gone.
pub(crate) fn tolerate(plugin: &'static str, err: BotError) -> PluginResult<()> {
    if err.is_connection_lost() {
        return Err(BotError::plugin(plugin, format!("connection lost: {err}")));
    }
    tracing::warn!(plugin, error = %err, "tick failed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use ts3query_client::ClientError;

    use super::*;

    #[test]
    fn tolerate_keeps_going_on_server_errors() {
        let err = BotError::from(ClientError::Server {
            id: 768,
            message: "invalid channelID".into(),
            extra: None,
        });
        assert!(tolerate("doodler", err).is_ok());
    }

    #[test]
    fn tolerate_stops_on_lost_session() {
        let err = tolerate("doodler", ClientError::NotConnected.into()).unwrap_err();
        assert!(matches!(err, BotError::Plugin { plugin, .. } if plugin == "doodler"));
    }
}
