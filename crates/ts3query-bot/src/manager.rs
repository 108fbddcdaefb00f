//! Runs plugins as tasks and stops them on shutdown.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use ts3query_client::Ts3Client;

use crate::plugin::{Plugin, PluginContext, PluginResult, QueryStream};
use crate::signals::ShutdownHandle;

/// How a plugin task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginExit {
    Finished,
    Failed(String),
    Panicked,
    /// Did not finish within the join timeout and was aborted.
    Stalled,
}

pub struct PluginManager<S = TcpStream> {
    client: Ts3Client<S>,
    shutdown: ShutdownHandle,
    join_timeout: Duration,
    pending: Vec<Box<dyn Plugin<S>>>,
    running: Vec<(&'static str, JoinHandle<PluginResult<()>>)>,
}

impl<S: QueryStream> PluginManager<S> {
    pub fn new(client: Ts3Client<S>, shutdown: ShutdownHandle, join_timeout: Duration) -> Self {
        Self {
            client,
            shutdown,
            join_timeout,
            pending: Vec::new(),
            running: Vec::new(),
        }
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin<S>>) {
        self.pending.push(plugin);
    }

    /// Names of the plugin tasks started so far.
    pub fn running(&self) -> Vec<&'static str> {
        self.running.iter().map(|(name, _)| *name).collect()
    }

    /// Spawns one task per registered plugin.
    pub fn start(&mut self) {
        info!(plugins = self.pending.len(), "starting plugins");
        for plugin in self.pending.drain(..) {
            let name = plugin.name();
            let ctx = PluginContext::new(self.client.clone(), self.shutdown.clone());
            let task = tokio::spawn(plugin.run(ctx));
            info!(plugin = name, "plugin started");
            self.running.push((name, task));
        }
    }

    /// Triggers shutdown and joins every plugin, each within the join
    /// timeout. Failures are logged, not returned.
    pub async fn stop(&mut self) -> Vec<(&'static str, PluginExit)> {
        info!("stopping all plugins");
        self.shutdown.trigger();

        let mut exits = Vec::with_capacity(self.running.len());
        for (name, mut task) in self.running.drain(..) {
            let exit = match tokio::time::timeout(self.join_timeout, &mut task).await {
                Ok(Ok(Ok(()))) => {
                    info!(plugin = name, "plugin stopped");
                    PluginExit::Finished
                }
                Ok(Ok(Err(err))) => {
                    warn!(plugin = name, error = %err, "plugin failed");
                    PluginExit::Failed(err.to_string())
                }
                Ok(Err(join_err)) => {
                    error!(plugin = name, error = %join_err, "plugin panicked");
                    PluginExit::Panicked
                }
                Err(_) => {
                    warn!(
                        plugin = name,
                        timeout_secs = self.join_timeout.as_secs(),
                        "plugin did not stop in time, aborting"
                    );
                    task.abort();
                    PluginExit::Stalled
                }
            };
            exits.push((name, exit));
        }
        exits
    }
}
