//! Moves idle clients into an AFK channel.

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ts3query_client::{ClientEntry, Ts3Client};

use crate::error::BotError;
use crate::plugin::{Plugin, PluginContext, PluginResult, QueryStream, tolerate};

pub const NAME: &str = "afk_mover";

fn default_afk_time() -> u64 {
    30 * 60
}

fn default_check_interval() -> u64 {
    5
}

fn default_move_message() -> Option<String> {
    Some("You have been moved to the AFK channel.".to_string())
}

/// `[plugins.afk_mover]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfkMoverConfig {
    pub afk_channel_id: i64,

    /// Idle seconds before a client is moved.
    #[serde(default = "default_afk_time")]
    pub afk_time: u64,

    /// Seconds between checks.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,

    /// Channels whose clients are never moved.
    #[serde(default)]
    pub ignore_channels: Vec<i64>,

    /// Private notice sent after the move. Set to "" to disable.
    #[serde(default = "default_move_message")]
    pub move_message: Option<String>,
}

impl AfkMoverConfig {
    pub fn validate(&self) -> PluginResult<()> {
        if self.check_interval == 0 {
            return Err(BotError::plugin(NAME, "check_interval must be at least 1s"));
        }
        Ok(())
    }
}

pub struct AfkMover {
    config: AfkMoverConfig,
}

impl AfkMover {
    pub fn new(config: AfkMoverConfig) -> Self {
        Self { config }
    }

    fn skips(&self, entry: &ClientEntry) -> bool {
        if entry.is_query() {
            return true;
        }
        match entry.cid {
            Some(cid) => cid == self.config.afk_channel_id || self.config.ignore_channels.contains(&cid),
            None => true,
        }
    }

    /// One pass over the client list. Returns how many clients were moved.
    ///
    /// A client the server refuses to move is skipped; only a lost
    /// connection ends the pass early.
    pub(crate) async fn tick<S: QueryStream>(&self, client: &Ts3Client<S>) -> PluginResult<usize> {
        let mut moved = 0;

        for entry in client.get_clients().await? {
            if self.skips(&entry) {
                continue;
            }
            let Some(clid) = entry.clid else { continue };

            match self.handle(client, clid, &entry).await {
                Ok(true) => moved += 1,
                Ok(false) => {}
                Err(err) if err.is_connection_lost() => return Err(err),
                Err(err) => warn!(clid, error = %err, "could not move client, skipping"),
            }
        }
        Ok(moved)
    }

    async fn handle<S: QueryStream>(&self, client: &Ts3Client<S>, clid: i64, entry: &ClientEntry) -> PluginResult<bool> {
        let afk_ms = self.config.afk_time.saturating_mul(1000);
        let idle_ms = match entry.client_idle_time {
            Some(idle) => idle,
            None => client.get_client_info(clid).await?.client_idle_time.unwrap_or(0),
        };
        if idle_ms <= afk_ms as i64 {
            return Ok(false);
        }

        let nickname = entry.client_nickname.as_deref().unwrap_or("?");
        info!(clid, nickname, idle_ms, "moving client to AFK channel");
        client.move_client(clid, self.config.afk_channel_id).await?;
        if let Some(message) = self.config.move_message.as_deref().filter(|m| !m.is_empty()) {
            client.send_private_message(clid, message).await?;
        }
        Ok(true)
    }

    async fn run_loop<S: QueryStream>(self, ctx: PluginContext<S>) -> PluginResult<()> {
        let interval = Duration::from_secs(self.config.check_interval);
        info!(
            channel = self.config.afk_channel_id,
            afk_time = self.config.afk_time,
            "AFK mover started"
        );

        while !ctx.is_shutdown() {
            debug!("checking for AFK clients");
            if let Err(err) = self.tick(ctx.client()).await {
                tolerate(NAME, err)?;
            }
            if !ctx.sleep(interval).await {
                break;
            }
        }
        Ok(())
    }
}

impl<S: QueryStream> Plugin<S> for AfkMover {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(self: Box<Self>, ctx: PluginContext<S>) -> BoxFuture<'static, PluginResult<()>> {
        Box::pin(self.run_loop(ctx))
    }
}
