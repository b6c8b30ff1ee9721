use std::sync::Arc;

use anyhow::{Context, Result};
use hookwire::bot::Bot;
use hookwire::config::Config;
use hookwire::dispatch::{HookContext, TracingLogger};
use hookwire::server;
use hookwire::webhooks::events::PingEvent;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hookwire=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    info!(version = env!("CARGO_PKG_VERSION"), ?config, "Starting hookwire");

    let bot = Bot::new(config.bot_config());
    if config.log_triggers {
        bot.set_logger(Arc::new(TracingLogger));
    }
    bot.register(|_ctx: HookContext, ping: Arc<PingEvent>| async move {
        info!(zen = ping.zen.as_deref(), hook_id = ping.hook_id, "Ping received");
        Ok(())
    });

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutting down");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "Failed to listen for ctrl-c"),
            }
        }
    });

    server::serve(bot, config.bind_address, shutdown)
        .await
        .context("server error")
}
