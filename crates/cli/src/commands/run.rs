//! Run command - poll sources and emit new posts

use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use vk_wall_watch_adapters::{outbox::OutboxWriter, state::SqliteCursorStore, vk_api::VkWallClient};
use vk_wall_watch_domain::{
    SyncedPost, SystemClock,
    usecases::{SourceSelection, SyncConfig, SyncEngine},
};

use crate::args::RunArgs;
use crate::config::AppConfig;

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let selection = source_selection(&config)?;

    tracing::info!(
        once = args.once,
        from_subscriptions = config.watch.from_subscriptions,
        sources = ?config.watch.sources,
        outbox = ?args.outbox,
        "Starting vk-wall-watch run"
    );

    // Build dependencies
    let cursor_store = Arc::new(
        SqliteCursorStore::new(&config.general.state_db_path)
            .await
            .context("Failed to initialize SQLite cursor store")?,
    );

    let access_token = load_access_token(&config.vk.access_token_env)?;
    let wall_client = Arc::new(VkWallClient::new(access_token));

    let outbox = match &args.outbox {
        Some(path) => Some(
            OutboxWriter::new(path.clone())
                .await
                .context("Failed to initialize outbox writer")?,
        ),
        None => None,
    };

    let mut sync_config = SyncConfig::new(selection);
    sync_config.source_delay = Duration::from_millis(config.watch.source_delay_ms);

    let engine = SyncEngine::new(
        wall_client,
        cursor_store,
        Arc::new(SystemClock),
        sync_config,
    );

    // Execute
    if args.once {
        tracing::info!("Running single poll cycle");
        let batch = engine.poll_once().await?;
        deliver(&batch, args.json, outbox.as_ref()).await?;
        tracing::info!(emitted = batch.len(), "Poll cycle complete");
    } else {
        // Continuous polling loop
        let poll_interval = Duration::from_secs(config.watch.poll_interval_secs);
        let mut ticker = interval(poll_interval);

        // Set up graceful shutdown
        let shutdown = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
            tracing::info!("Shutdown signal received");
        };

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match engine.poll_once().await {
                        Ok(batch) => {
                            if !batch.is_empty() {
                                tracing::info!(emitted = batch.len(), "Poll cycle complete");
                            }
                            deliver(&batch, args.json, outbox.as_ref()).await?;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Poll cycle failed");
                        }
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutting down gracefully");
                    break;
                }
            }
        }
    }

    tracing::info!("vk-wall-watch run completed");
    Ok(())
}

/// Write the emitted batch to stdout and/or the outbox file
async fn deliver(batch: &[SyncedPost], json: bool, outbox: Option<&OutboxWriter>) -> Result<()> {
    if json {
        for post in batch {
            println!("{}", serde_json::to_string(post)?);
        }
    }

    if let Some(outbox) = outbox {
        outbox
            .append_batch(batch)
            .await
            .context("Failed to write outbox")?;
    }

    Ok(())
}

fn source_selection(config: &AppConfig) -> Result<SourceSelection> {
    if config.watch.from_subscriptions {
        Ok(SourceSelection::FromSubscriptions {
            exclude: config.watch.exclude_sources.clone(),
        })
    } else {
        if config.watch.sources.is_empty() {
            bail!("No sources configured; set [watch] sources or from_subscriptions = true");
        }
        Ok(SourceSelection::Explicit(config.watch.sources.clone()))
    }
}

pub(crate) fn load_access_token(env_var: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No access token env var configured");
    }

    let token = std::env::var(env_var)
        .with_context(|| format!("Missing access token env var {}", env_var))?;

    if token.trim().is_empty() {
        bail!("Access token env var {} is empty", env_var);
    }

    Ok(SecretString::new(token.into()))
}
