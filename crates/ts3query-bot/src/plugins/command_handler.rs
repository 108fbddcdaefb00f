//! Dispatches prefixed chat messages to chat commands.
//!
//! A message `!help foo` with prefix `!` runs the command whose trigger is
//! `help`. Every prefixed message is marked used, matched or not, so no
//! other consumer acts on it.

use std::collections::BTreeMap;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ts3query_client::Ts3Client;
use ts3query_protocol::Message;

use crate::error::BotError;
use crate::plugin::{Plugin, PluginContext, PluginResult, QueryStream, tolerate};

pub const NAME: &str = "command_handler";

/// Chat commands this handler can load, by config name.
pub const KNOWN_COMMANDS: [&str; 1] = ["help"];

fn default_prefix() -> String {
    "!".to_string()
}

fn default_check_interval() -> u64 {
    1
}

/// `[plugins.command_handler.commands.<name>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub trigger: String,
}

/// `[plugins.command_handler]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHandlerConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_check_interval")]
    pub check_interval: u64,

    /// Commands to load, keyed by command name.
    #[serde(default)]
    pub commands: BTreeMap<String, CommandConfig>,
}

impl Default for CommandHandlerConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            check_interval: default_check_interval(),
            commands: BTreeMap::new(),
        }
    }
}

impl CommandHandlerConfig {
    pub fn validate(&self) -> PluginResult<()> {
        if self.prefix.is_empty() {
            return Err(BotError::plugin(NAME, "prefix must not be empty"));
        }
        if self.check_interval == 0 {
            return Err(BotError::plugin(NAME, "check_interval must be at least 1s"));
        }
        for (name, command) in &self.commands {
            if command.trigger.is_empty() || command.trigger.contains(char::is_whitespace) {
                return Err(BotError::plugin(
                    NAME,
                    format!("command {name}: trigger must be a single word"),
                ));
            }
        }
        Ok(())
    }

    /// Triggers of loadable commands as users type them, prefix included.
    pub fn triggers(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter(|(name, _)| KNOWN_COMMANDS.contains(&name.as_str()))
            .map(|(_, command)| format!("{}{}", self.prefix, command.trigger))
            .collect()
    }
}

/// A chat command run by [`CommandHandler`].
pub trait ChatCommand<S>: Send + Sync {
    fn trigger(&self) -> &str;

    /// Handles one message. `args` is the text after the trigger.
    fn run<'a>(
        &'a self,
        client: &'a Ts3Client<S>,
        message: &'a Message,
        args: &'a str,
    ) -> BoxFuture<'a, PluginResult<()>>;
}

/// Lists the configured triggers to whoever asked.
pub struct Help {
    trigger: String,
    triggers: Vec<String>,
}

impl Help {
    pub fn new(trigger: impl Into<String>, triggers: Vec<String>) -> Self {
        Self {
            trigger: trigger.into(),
            triggers,
        }
    }
}

impl<S: QueryStream> ChatCommand<S> for Help {
    fn trigger(&self) -> &str {
        &self.trigger
    }

    fn run<'a>(
        &'a self,
        client: &'a Ts3Client<S>,
        message: &'a Message,
        _args: &'a str,
    ) -> BoxFuture<'a, PluginResult<()>> {
        Box::pin(async move {
            let invoker = message.invoker_id;
            info!(invoker = %message.invoker_name, "help requested");
            client.send_private_message(invoker, "Available commands:").await?;
            client
                .send_private_message(invoker, &self.triggers.join("\n"))
                .await?;
            Ok(())
        })
    }
}

pub struct CommandHandler<S> {
    prefix: String,
    check_interval: Duration,
    commands: Vec<Box<dyn ChatCommand<S>>>,
}

impl<S: QueryStream> CommandHandler<S> {
    /// Loads the commands named in `config`. Unknown names are skipped.
    pub fn from_config(config: &CommandHandlerConfig) -> Self {
        let mut handler = Self::new(&config.prefix, Duration::from_secs(config.check_interval));
        for (name, command) in &config.commands {
            match name.as_str() {
                "help" => handler.register(Box::new(Help::new(&command.trigger, config.triggers()))),
                other => warn!(command = other, "unknown chat command, skipping"),
            }
        }
        handler
    }

    pub fn new(prefix: impl Into<String>, check_interval: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            check_interval,
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, command: Box<dyn ChatCommand<S>>) {
        info!(trigger = command.trigger(), "loaded chat command");
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Splits `content` into trigger and arguments if it carries the prefix.
    fn parse<'m>(&self, content: &'m str) -> Option<(&'m str, &'m str)> {
        let rest = content.strip_prefix(self.prefix.as_str())?;
        Some(rest.split_once(' ').unwrap_or((rest, "")))
    }

    /// Dispatches unread messages. Returns how many commands ran.
    pub(crate) async fn tick(&self, client: &Ts3Client<S>) -> PluginResult<usize> {
        let mut dispatched = 0;

        for received in client.unread_messages() {
            let message = received.item();
            let Some((trigger, args)) = self.parse(&message.content) else {
                continue;
            };
            received.mark_used();

            let Some(command) = self.commands.iter().find(|c| c.trigger() == trigger) else {
                debug!(trigger, "no command for trigger");
                continue;
            };
            debug!(trigger, invoker = %message.invoker_name, "running chat command");
            if let Err(err) = command.run(client, message, args).await {
                tolerate(NAME, err)?;
            }
            dispatched += 1;
        }
        Ok(dispatched)
    }

    async fn run_loop(self, ctx: PluginContext<S>) -> PluginResult<()> {
        if self.is_empty() {
            info!("no chat commands loaded, command handler exits");
            return Ok(());
        }
        info!(commands = self.len(), prefix = %self.prefix, "command handler started");

        while !ctx.is_shutdown() {
            if let Err(err) = self.tick(ctx.client()).await {
                tolerate(NAME, err)?;
            }
            if !ctx.sleep(self.check_interval).await {
                break;
            }
        }
        Ok(())
    }
}

impl<S: QueryStream> Plugin<S> for CommandHandler<S> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(self: Box<Self>, ctx: PluginContext<S>) -> BoxFuture<'static, PluginResult<()>> {
        Box::pin(self.run_loop(ctx))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::io::DuplexStream;
    use ts3query_client::test_support::{FakeServer, ok, push};

    use super::*;
    use crate::testing::client;

    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ChatCommand<DuplexStream> for Recorder {
        fn trigger(&self) -> &str {
            "echo"
        }

        fn run<'a>(
            &'a self,
            _client: &'a Ts3Client<DuplexStream>,
            _message: &'a Message,
            args: &'a str,
        ) -> BoxFuture<'a, PluginResult<()>> {
            self.calls.lock().unwrap().push(args.to_string());
            Box::pin(async { Ok(()) })
        }
    }

    fn config() -> CommandHandlerConfig {
        let mut commands = BTreeMap::new();
        commands.insert("help".to_string(), CommandConfig { trigger: "help".into() });
        commands.insert("weather".to_string(), CommandConfig { trigger: "wetter".into() });
        CommandHandlerConfig {
            commands,
            ..Default::default()
        }
    }

    #[test]
    fn config_parsing() {
        let config: CommandHandlerConfig = toml::from_str(
            r#"
            prefix = "."
            [commands.help]
            trigger = "h"
            "#,
        )
        .unwrap();
        assert_eq!(config.prefix, ".");
        assert_eq!(config.check_interval, 1);
        assert_eq!(config.triggers(), [".h"]);
        config.validate().unwrap();
    }

    #[test]
    fn multi_word_trigger_rejected() {
        let mut config = config();
        config
            .commands
            .insert("help".into(), CommandConfig { trigger: "two words".into() });
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_commands_are_skipped() {
        let handler = CommandHandler::<DuplexStream>::from_config(&config());
        assert_eq!(handler.len(), 1);
    }

    #[test]
    fn parse_splits_trigger_and_args() {
        let handler = CommandHandler::<DuplexStream>::new("!", Duration::from_secs(1));
        assert_eq!(handler.parse("!echo a b"), Some(("echo", "a b")));
        assert_eq!(handler.parse("!echo"), Some(("echo", "")));
        assert_eq!(handler.parse("echo"), None);
    }

    fn chat(content: &str) -> String {
        push(&format!(
            "notifytextmessage targetmode=1 msg={content} target=1 invokerid=5 invokername=Al invokeruid=abc="
        ))
    }

    #[tokio::test]
    async fn dispatches_and_marks_prefixed_messages() {
        let sent = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&sent);
        let (client, _server) = client(FakeServer::new(move |line: &str| {
            if line == "version" && counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Some(format!(
                    "{}{}{}{}",
                    chat("!echo\\shello\\sworld"),
                    chat("plain\\stalk"),
                    chat("!nope"),
                    ok("")
                ))
            } else {
                Some(ok(""))
            }
        }))
        .await;
        client.connection().commands().version().await.unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut handler = CommandHandler::new("!", Duration::from_secs(1));
        handler.register(Box::new(Recorder {
            calls: Arc::clone(&calls),
        }));

        assert_eq!(handler.tick(&client).await.unwrap(), 1);
        assert_eq!(*calls.lock().unwrap(), ["hello world"]);

        let unread: Vec<_> = client
            .unread_messages()
            .iter()
            .map(|m| m.item().content.clone())
            .collect();
        assert_eq!(unread, ["plain talk"]);
    }

    #[tokio::test]
    async fn help_lists_triggers_to_invoker() {
        let (client, server) = client(FakeServer::new(|line: &str| {
            if line == "version" {
                Some(format!("{}{}", chat("!help"), ok("")))
            } else {
                Some(ok(""))
            }
        }))
        .await;
        client.connection().commands().version().await.unwrap();

        let handler = CommandHandler::from_config(&config());
        assert_eq!(handler.tick(&client).await.unwrap(), 1);
        assert_eq!(
            &server.received()[1..],
            [
                "sendtextmessage targetmode=1 target=5 msg=Available\\scommands:",
                "sendtextmessage targetmode=1 target=5 msg=!help",
            ]
        );
    }
}
