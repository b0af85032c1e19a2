use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use searchbot::api::{create_router, serve};
use searchbot::config::Config;
use searchbot::dispatcher::{BotContext, Dispatcher};
use searchbot::error::BotError;
use searchbot::fetcher::SearchFetcher;
use searchbot::poller::Poller;
use searchbot::telegram::{ChatClient, TelegramClient};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Telegram bot answering every message with web search results.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Extra env file to load before reading configuration.
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Number of search workers; overrides BOT_WORKERS.
    #[arg(long)]
    workers: Option<usize>,

    /// Long poll even if WEBHOOK_HOST is set.
    #[arg(long)]
    long_poll: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let cli = Cli::parse();
    if let Some(path) = &cli.env_file {
        dotenvy::from_path(path).with_context(|| format!("cannot load {}", path.display()))?;
    }

    let mut config = Config::from_env().context("cannot load configuration")?;
    if let Some(workers) = cli.workers {
        config.workers = workers.max(1);
    }
    if cli.long_poll {
        config.webhook_host = None;
    }

    let client = Arc::new(TelegramClient::with_api_url(
        &config.telegram_token,
        &config.telegram_api_url,
    )?);
    let me = client.get_me().await.context("cannot init telegram bot api")?;
    tracing::info!(username = ?me.username, "authorized on telegram");

    let fetcher = SearchFetcher::new(&config.search_url, config.search_timeout)?;
    let ctx = Arc::new(BotContext::new(client.clone(), fetcher));
    let dispatcher = Arc::new(Dispatcher::new(ctx, config.workers, config.queue_capacity));
    let cancel = CancellationToken::new();

    let mut receiver = match config.webhook_url() {
        Some(url) => {
            client.set_webhook(&url).await.context("cannot set webhook")?;
            let info = client.get_webhook_info().await.context("cannot get webhook info")?;
            tracing::info!(
                pending = info.pending_update_count,
                last_error = ?info.last_error_message,
                "webhook set"
            );
            let router = create_router(dispatcher.clone(), &config.telegram_token);
            tokio::spawn(serve(router, config.port, cancel.clone()))
        }
        None => {
            client
                .delete_webhook()
                .await
                .context("cannot remove webhook before long polling")?;
            let poller = Poller::new(dispatcher.clone());
            let cancel = cancel.clone();
            tokio::spawn(async move {
                poller.run(cancel).await;
                Ok::<(), BotError>(())
            })
        }
    };
    tracing::info!(workers = config.workers, "started");

    let finished = tokio::select! {
        signal = shutdown_signal() => {
            tracing::info!("got exit signal: {signal}");
            None
        }
        res = &mut receiver => Some(res),
    };
    cancel.cancel();
    match finished {
        None => {
            if let Ok(Err(e)) = receiver.await {
                tracing::error!("update receiver failed: {:#}", e);
            }
        }
        Some(Ok(Ok(()))) => tracing::warn!("update receiver stopped"),
        Some(Ok(Err(e))) => return Err(e).context("update receiver failed"),
        Some(Err(e)) => return Err(e).context("update receiver panicked"),
    }

    if tokio::time::timeout(SHUTDOWN_GRACE, dispatcher.shutdown()).await.is_err() {
        tracing::warn!("in-flight tasks still running after {:?}, exiting", SHUTDOWN_GRACE);
    }
    Ok(())
}

async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("cannot listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "interrupt",
        _ = terminate => "terminate",
    }
}
