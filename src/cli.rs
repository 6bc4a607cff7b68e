use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::{seconds, FeederConfig};
use crate::constants::{DEFAULT_ENDPOINT, DEFAULT_SOURCE_FILE};
use crate::tail::TailArgs;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Backtest data feeder: replays CSV ticks over a ZeroMQ PUB socket",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

impl Cli {
    pub fn command(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay the tick file over the PUB socket (default)
    Run(RunArgs),
    /// Subscribe to a feeder and print incoming ticks
    Tail(TailArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Path to the CSV tick file
    #[arg(short, long, default_value = DEFAULT_SOURCE_FILE)]
    pub file: PathBuf,

    /// PUB endpoint to bind
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Seconds between sends
    #[arg(short, long, default_value_t = 0.01)]
    pub delay: f64,

    /// Seconds to wait after binding before the first send
    #[arg(short, long, default_value_t = 1.0)]
    pub warmup: f64,
}

impl RunArgs {
    pub fn into_config(self) -> Result<FeederConfig> {
        Ok(FeederConfig {
            source: self.file,
            endpoint: self.endpoint,
            delay: seconds("--delay", self.delay)?,
            warmup: seconds("--warmup", self.warmup)?,
        })
    }
}
