//! Runs the bot until SIGINT or SIGTERM.

use tracing::{info, warn};

use ts3query_client::Ts3Client;

use crate::config::BotConfig;
use crate::error::BotResult;
use crate::manager::PluginManager;
use crate::plugin::QueryStream;
use crate::signals::{ShutdownHandle, SignalHandler};

/// Connects with the configured settings and serves until a signal.
pub async fn run(config: &BotConfig) -> BotResult<()> {
    config.validate()?;

    let signals = SignalHandler::new();
    signals.spawn_listener();

    let client = Ts3Client::connect(&config.connection()).await?;
    serve(client, config, signals.shutdown_handle()).await
}

/// Enables notifications, starts polling and the plugins, then waits for
/// `shutdown` and tears everything down in reverse order.
pub async fn serve<S: QueryStream>(
    client: Ts3Client<S>,
    config: &BotConfig,
    shutdown: ShutdownHandle,
) -> BotResult<()> {
    if let Err(err) = start(&client, config).await {
        close(&client).await;
        return Err(err);
    }

    let mut manager = PluginManager::new(client.clone(), shutdown.clone(), config.plugin_join_timeout());
    match config.plugins.build::<S>() {
        Ok(plugins) => plugins.into_iter().for_each(|plugin| manager.register(plugin)),
        Err(err) => {
            close(&client).await;
            return Err(err);
        }
    }
    manager.start();
    info!(name = %config.bot.name, "bot running");

    shutdown.wait().await;
    info!("shutting down");

    manager.stop().await;
    close(&client).await;
    Ok(())
}

async fn start<S: QueryStream>(client: &Ts3Client<S>, config: &BotConfig) -> BotResult<()> {
    client.enable_events_and_messages().await?;
    client.start_polling(config.polling_rate())?;
    Ok(())
}

/// Best-effort teardown.
async fn close<S: QueryStream>(client: &Ts3Client<S>) {
    if let Err(err) = client.stop_polling().await {
        warn!(error = %err, "failed to stop polling");
    }
    if let Err(err) = client.disconnect().await {
        warn!(error = %err, "disconnect failed");
    }
}
