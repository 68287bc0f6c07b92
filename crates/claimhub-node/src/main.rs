//! Claim index hub binary.
//!
//! `run` follows the primary writer and logs every change event; `resolve`
//! and `db-state` are one-shot tools over the same replica.

mod cli;

use clap::Parser;
use claimhub_db::rows::ClaimHash;
use claimhub_db::{Follower, FollowerConfig, SecondaryDb};
use claimhub_resolver::{Resolution, Resolver, ResolverConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match cli::Cli::parse().command {
        cli::Command::Run(cmd) => run(cmd).await,
        cli::Command::Resolve(cmd) => resolve(cmd),
        cli::Command::DbState(cmd) => db_state(cmd),
    }
}

/// Opens the replica; the temporary directory, when used, must outlive it.
fn open_db(params: &cli::DbParams) -> anyhow::Result<(Arc<SecondaryDb>, Option<TempDir>)> {
    let (secondary_path, tmp): (PathBuf, Option<TempDir>) = match &params.secondary_path {
        Some(path) => (path.clone(), None),
        None => {
            let tmp = tempfile::tempdir()?;
            (tmp.path().to_path_buf(), Some(tmp))
        }
    };
    let db = SecondaryDb::open(&params.db_path, &secondary_path)?;
    db.try_catch_up_with_primary()?;
    Ok((Arc::new(db), tmp))
}

fn parse_channel_hashes(ids: &[String]) -> Vec<ClaimHash> {
    ids.iter()
        .filter_map(|id| match hex::decode(id) {
            Ok(bytes) if bytes.len() == 20 => {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&bytes);
                Some(hash)
            }
            _ => {
                tracing::warn!(id = %id, "ignoring invalid channel id");
                None
            }
        })
        .collect()
}

async fn run(cmd: cli::RunCmd) -> anyhow::Result<()> {
    let (db, _tmp) = open_db(&cmd.db)?;

    let (follower, handle) = Follower::new(
        db,
        FollowerConfig {
            interval: Duration::from_secs(cmd.catch_up_interval.max(1)),
            ..FollowerConfig::default()
        },
    );

    if let Some(state) = handle.current_state() {
        tracing::info!(height = state.height, "starting at writer state");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut events = handle.subscribe();

    let follower_task = (!cmd.no_refresh).then(|| tokio::spawn(follower.run(shutdown_rx)));
    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::info!(
                height = event.height,
                tip = %hex::encode(event.tip),
                touched_claims = event.touched_claims.len(),
                touched_hashxs = event.touched_hashxs.len(),
                reorg = event.reorg,
                "new tip"
            );
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    let _ = shutdown_tx.send(true);
    if let Some(task) = follower_task {
        task.await?;
    }
    event_log.abort();
    Ok(())
}

fn resolve(cmd: cli::ResolveCmd) -> anyhow::Result<()> {
    let (db, _tmp) = open_db(&cmd.db)?;
    let resolver = Resolver::new(
        db,
        ResolverConfig {
            blocking_channel_hashes: parse_channel_hashes(&cmd.moderation.blocking_channel_ids),
            filtering_channel_hashes: parse_channel_hashes(&cmd.moderation.filtering_channel_ids),
        },
    );

    for url in &cmd.urls {
        let deadline = cmd
            .timeout_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        match resolver.resolve_with_deadline(url, deadline) {
            Ok(resolution) => print_resolution(url, &resolution),
            Err(e) => println!("{url}: error: {e}"),
        }
    }
    Ok(())
}

fn print_resolution(url: &str, resolution: &Resolution) {
    match resolution {
        Resolution::Stream {
            claim,
            channel,
            filtered,
        } => {
            println!(
                "{url}: stream {name}#{id} amount={amount} effective={effective}{filtered}",
                name = claim.name,
                id = claim.claim_id,
                amount = claim.amount,
                effective = claim.effective_amount,
                filtered = if *filtered { " [filtered]" } else { "" },
            );
            if let Some(channel) = channel {
                println!("  in channel @{}#{}", channel.name, channel.claim_id);
            }
        }
        Resolution::Channel { claim, filtered } => {
            println!(
                "{url}: channel @{name}#{id} effective={effective}{filtered}",
                name = claim.name,
                id = claim.claim_id,
                effective = claim.effective_amount,
                filtered = if *filtered { " [filtered]" } else { "" },
            );
        }
        Resolution::Blocked { blocking_channel } => {
            println!(
                "{url}: blocked by channel {}",
                hex::encode(blocking_channel)
            );
        }
    }
}

fn db_state(cmd: cli::DbStateCmd) -> anyhow::Result<()> {
    let (db, _tmp) = open_db(&cmd.db)?;
    match db.db_state()? {
        Some(state) => {
            println!("height:         {}", state.height);
            println!("tip:            {}", hex::encode(state.tip));
            println!("genesis:        {}", hex::encode(state.genesis));
            println!("tx count:       {}", state.tx_count);
            println!("db version:     {}", state.db_version);
            println!("first sync:     {}", state.first_sync);
            println!("es sync height: {}", state.es_sync_height);
            match db.block_hash(state.height)? {
                Some(hash) if hash == state.tip => println!("block hash:     consistent"),
                Some(hash) => println!("block hash:     MISMATCH ({})", hex::encode(hash)),
                None => println!("block hash:     missing"),
            }
        }
        None => println!("the writer has not initialized the state row yet"),
    }
    Ok(())
}
