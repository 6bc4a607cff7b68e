use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use zeromq::{Socket, SocketRecv, SubSocket, ZmqMessage};

use crate::constants::DEFAULT_ENDPOINT;
use crate::logging;
use crate::tick::Tick;

#[derive(Debug, Args, Clone)]
pub struct TailArgs {
    /// PUB endpoint to subscribe to
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Filter ticks to a single symbol (e.g. AAPL)
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Stop after printing this many ticks
    #[arg(short, long)]
    pub limit: Option<usize>,
}

pub async fn run(args: TailArgs) -> Result<()> {
    let mut socket = SubSocket::new();
    socket.connect(&args.endpoint).await.with_context(|| {
        format!(
            "failed to connect to {}; start the feeder with `cargo run` first",
            args.endpoint
        )
    })?;
    socket
        .subscribe("")
        .await
        .context("failed to subscribe to all ticks")?;

    let mut printed = 0usize;
    println!("Connected to {}; streaming ticks...", args.endpoint);

    loop {
        let message = tokio::select! {
            message = socket.recv() => message.context("failed to receive tick")?,
            _ = tokio::signal::ctrl_c() => break,
        };

        let tick = match decode(message) {
            Ok(tick) => tick,
            Err(err) => {
                logging::warn(
                    "tail.malformed",
                    "Skipping payload that does not match the tick schema",
                    json!({ "error": format!("{err:#}") }),
                );
                continue;
            }
        };

        if let Some(ref filter) = args.symbol {
            if filter != &tick.symbol {
                continue;
            }
        }

        println!(
            "{:>16} | {:>12} | {:>12.4} | {:>12.4}",
            tick.timestamp_ms, tick.symbol, tick.price, tick.volume
        );
        printed += 1;

        if let Some(limit) = args.limit {
            if printed >= limit {
                break;
            }
        }
    }

    let _ = socket.close().await;
    Ok(())
}

fn decode(message: ZmqMessage) -> Result<Tick> {
    let bytes: Vec<u8> = message
        .try_into()
        .map_err(|err| anyhow::anyhow!("unexpected multipart message: {err}"))?;
    let payload = String::from_utf8(bytes).context("payload is not UTF-8")?;
    Ok(Tick::from_wire(&payload)?)
}
