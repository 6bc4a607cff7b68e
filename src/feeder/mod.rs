mod dispatch;

use anyhow::{Context, Result};
use serde_json::json;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

use crate::config::FeederConfig;
use crate::loader::load_ticks;
use crate::logging;
use crate::publisher::{BroadcastChannel, PublishError, Publisher};
use crate::tick::Tick;

pub use dispatch::{dispatch, DispatchOutcome};

use dispatch::{pause, Pause};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownSignal {
    None,
    Interrupt,
}

impl ShutdownSignal {
    pub fn is_requested(self) -> bool {
        !matches!(self, ShutdownSignal::None)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeederSummary {
    pub loaded: usize,
    pub sent: usize,
    pub interrupted: bool,
}

/// Replays the configured file with SIGINT/SIGTERM wired to the shutdown channel.
pub async fn run_with_config(config: FeederConfig) -> Result<FeederSummary> {
    let (shutdown_tx, shutdown_rx) = watch::channel(ShutdownSignal::None);
    let signals_task = tokio::spawn(handle_signals(shutdown_tx));

    let result = run_with_shutdown(config, shutdown_rx).await;

    signals_task.abort();
    if let Ok(Err(err)) = signals_task.await {
        logging::warn(
            "signal.handler_error",
            "Signal handler stopped with error",
            json!({ "error": format!("{err:#}") }),
        );
    }

    result
}

/// Validate, load, bind, replay, close.
///
/// Configuration and load errors surface before any socket is bound. Once the
/// publisher is open it is closed exactly once, whatever the replay outcome.
pub async fn run_with_shutdown(
    config: FeederConfig,
    mut shutdown: watch::Receiver<ShutdownSignal>,
) -> Result<FeederSummary> {
    if let Err(err) = config.validate() {
        logging::error(
            "feeder.config_error",
            "Refusing to start without a tick file",
            json!({ "path": config.source.display().to_string() }),
        );
        return Err(err.into());
    }

    let ticks = load_ticks(&config.source)
        .with_context(|| format!("failed to load ticks from {}", config.source.display()))?;
    logging::info(
        "feeder.loaded",
        "Loaded ticks",
        json!({ "count": ticks.len(), "path": config.source.display().to_string() }),
    );

    let publisher = Publisher::open(&config.endpoint).await?;
    let outcome = replay(publisher, ticks.as_slice(), &config, &mut shutdown).await?;

    let summary = FeederSummary {
        loaded: ticks.len(),
        sent: outcome.sent(),
        interrupted: matches!(outcome, DispatchOutcome::Interrupted { .. }),
    };
    if summary.interrupted {
        logging::warn(
            "feeder.interrupted",
            "Replay interrupted by user",
            json!({ "sent": summary.sent, "total": summary.loaded }),
        );
    } else {
        logging::info(
            "feeder.complete",
            "All ticks sent",
            json!({ "sent": summary.sent }),
        );
    }

    Ok(summary)
}

/// Warm-up pause, dispatch, then one `close` on every exit path.
///
/// The warm-up gives subscribers time to finish connecting before the first
/// send. Subscribers that connect later miss whatever was sent before they
/// joined.
pub async fn replay<C: BroadcastChannel>(
    mut channel: C,
    ticks: &[Tick],
    config: &FeederConfig,
    shutdown: &mut watch::Receiver<ShutdownSignal>,
) -> Result<DispatchOutcome, PublishError> {
    logging::info(
        "feeder.warmup",
        "Waiting for subscribers to connect",
        json!({ "warmup_ms": config.warmup.as_millis() as u64 }),
    );

    let result = match pause(config.warmup, shutdown).await {
        Pause::Interrupted => Ok(DispatchOutcome::Interrupted { sent: 0 }),
        Pause::Elapsed => dispatch(&mut channel, ticks, config.delay, shutdown).await,
    };

    channel.close().await;
    result
}

async fn handle_signals(shutdown_tx: watch::Sender<ShutdownSignal>) -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("failed to register SIGINT handler")?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    };
    logging::warn(
        "signal.received",
        "Interruption received, stopping replay",
        json!({ "signal": name }),
    );
    let _ = shutdown_tx.send(ShutdownSignal::Interrupt);
    Ok(())
}
