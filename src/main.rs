use anyhow::Result;
use backtest_feeder::cli::{self, Cli};
use backtest_feeder::feeder;
use backtest_feeder::tail;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command() {
        cli::Command::Run(args) => {
            feeder::run_with_config(args.into_config()?).await?;
            Ok(())
        }
        cli::Command::Tail(args) => tail::run(args).await,
    }
}
