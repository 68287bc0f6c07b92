//! Command-line interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "claimhub", about = "Read-only claim index hub", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Follow the primary writer and log change events.
    Run(RunCmd),

    /// Resolve one or more URLs against the current index.
    Resolve(ResolveCmd),

    /// Print the writer state the replica currently sees.
    DbState(DbStateCmd),
}

#[derive(Debug, Args)]
pub struct DbParams {
    /// Path to the primary claim index produced by the upstream writer.
    #[arg(long)]
    pub db_path: PathBuf,

    /// Directory for the secondary replica's cache. Defaults to a temporary
    /// directory; safe to delete between runs either way.
    #[arg(long)]
    pub secondary_path: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ModerationParams {
    /// Hex hash of a channel whose claims resolve as blocked. Repeatable.
    #[arg(long = "blocking-channel-id")]
    pub blocking_channel_ids: Vec<String>,

    /// Hex hash of a channel whose claims are flagged but returned.
    /// Repeatable.
    #[arg(long = "filtering-channel-id")]
    pub filtering_channel_ids: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RunCmd {
    #[command(flatten)]
    pub db: DbParams,

    /// Seconds between catch-up attempts.
    #[arg(long, default_value_t = 10)]
    pub catch_up_interval: u64,

    /// Do not run the refresh loop; the replica stays at the state it had
    /// at startup.
    #[arg(long)]
    pub no_refresh: bool,
}

#[derive(Debug, Args)]
pub struct ResolveCmd {
    #[command(flatten)]
    pub db: DbParams,

    #[command(flatten)]
    pub moderation: ModerationParams,

    /// Give up on each URL after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// URLs to resolve.
    #[arg(required = true)]
    pub urls: Vec<String>,
}

#[derive(Debug, Args)]
pub struct DbStateCmd {
    #[command(flatten)]
    pub db: DbParams,
}
