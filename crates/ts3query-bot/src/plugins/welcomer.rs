//! Greets clients as they join.

use std::time::Duration;

use futures_util::future::BoxFuture;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ts3query_client::Ts3Client;
use ts3query_core::ClientType;
use ts3query_protocol::Event;

use crate::error::BotError;
use crate::plugin::{Plugin, PluginContext, PluginResult, QueryStream, tolerate};

pub const NAME: &str = "welcomer";

fn default_messages() -> Vec<String> {
    vec!["Welcome to the server!".to_string()]
}

fn default_check_interval() -> u64 {
    1
}

/// `[plugins.welcomer]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomerConfig {
    /// One of these is picked at random per greeting.
    #[serde(default = "default_messages")]
    pub messages: Vec<String>,

    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
}

impl Default for WelcomerConfig {
    fn default() -> Self {
        Self {
            messages: default_messages(),
            check_interval: default_check_interval(),
        }
    }
}

impl WelcomerConfig {
    pub fn validate(&self) -> PluginResult<()> {
        if self.messages.is_empty() {
            return Err(BotError::plugin(NAME, "messages must not be empty"));
        }
        if self.check_interval == 0 {
            return Err(BotError::plugin(NAME, "check_interval must be at least 1s"));
        }
        Ok(())
    }
}

pub struct Welcomer {
    config: WelcomerConfig,
}

impl Welcomer {
    pub fn new(config: WelcomerConfig) -> Self {
        Self { config }
    }

    fn pick_greeting(&self) -> &str {
        self.config
            .messages
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or("Welcome to the server!")
    }

    /// Greets every client from unread enter-view events and marks them used.
    pub(crate) async fn tick<S: QueryStream>(&self, client: &Ts3Client<S>) -> PluginResult<usize> {
        let mut greeted = 0;

        for received in client.client_entered_events() {
            received.mark_used();
            let Event::ClientEnterView(entered) = received.item() else {
                continue;
            };
            if entered.kind() == Some(ClientType::Query) {
                continue;
            }
            let Some(clid) = entered.clid else { continue };

            let greeting = self.pick_greeting();
            info!(clid, nickname = entered.client_nickname.as_deref().unwrap_or("?"), "greeting client");
            client.send_private_message(clid, greeting).await?;
            greeted += 1;
        }
        Ok(greeted)
    }

    async fn run_loop<S: QueryStream>(self, ctx: PluginContext<S>) -> PluginResult<()> {
        let interval = Duration::from_secs(self.config.check_interval);
        info!(messages = self.config.messages.len(), "welcomer started");

        while !ctx.is_shutdown() {
            debug!("checking for new clients");
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

impl<S: QueryStream> Plugin<S> for Welcomer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(self: Box<Self>, ctx: PluginContext<S>) -> BoxFuture<'static, PluginResult<()>> {
        Box::pin(self.run_loop(ctx))
    }
}
