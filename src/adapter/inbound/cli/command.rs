//! Command-line interface definitions.
//!
//! `run` starts the poll loop; `show` prints the cumulative flow of one
//! market from the configured database.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Cumulative stake flow tracker for exchange markets
#[derive(Parser, Debug)]
#[command(name = "stakeflow")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll tracked markets until interrupted
    Run(RunArgs),

    /// Show cumulative flow for a market
    Show(ShowArgs),
}

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Keep totals in memory only (nothing is written to disk)
    #[arg(long)]
    pub ephemeral: bool,
}

/// Arguments for the `show` command.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Market id, e.g. 1.252151159
    pub market_id: String,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
