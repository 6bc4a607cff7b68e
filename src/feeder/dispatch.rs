use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use tokio::time;

use crate::logging;
use crate::publisher::{BroadcastChannel, PublishError};
use crate::tick::Tick;

use super::ShutdownSignal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed { sent: usize },
    Interrupted { sent: usize },
}

impl DispatchOutcome {
    pub fn sent(self) -> usize {
        match self {
            DispatchOutcome::Completed { sent } | DispatchOutcome::Interrupted { sent } => sent,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pause {
    Elapsed,
    Interrupted,
}

/// Publishes `ticks` strictly in order, one send per tick, pausing `delay`
/// between sends.
///
/// An interruption observed during a pause stops the loop before the next
/// send. Encoding and transport errors are returned as-is and never retried.
/// Closing the channel is the caller's job on every path.
pub async fn dispatch<C: BroadcastChannel>(
    channel: &mut C,
    ticks: &[Tick],
    delay: Duration,
    shutdown: &mut watch::Receiver<ShutdownSignal>,
) -> Result<DispatchOutcome, PublishError> {
    let total = ticks.len();
    let mut sent = 0usize;

    for (index, tick) in ticks.iter().enumerate().map(|(idx, tick)| (idx + 1, tick)) {
        if shutdown.borrow_and_update().is_requested() {
            return Ok(DispatchOutcome::Interrupted { sent });
        }

        let payload = tick.to_wire()?;
        channel.send(payload.clone()).await?;
        sent += 1;
        logging::info(
            "dispatch.sent",
            "Tick published",
            json!({ "index": index, "total": total, "payload": payload }),
        );

        if index < total && pause(delay, shutdown).await == Pause::Interrupted {
            return Ok(DispatchOutcome::Interrupted { sent });
        }
    }

    Ok(DispatchOutcome::Completed { sent })
}

/// Sleeps for `duration` unless an interruption arrives first.
///
/// A dropped shutdown sender means no interruption can arrive any more, so
/// the remaining time is simply slept out.
pub(crate) async fn pause(
    duration: Duration,
    shutdown: &mut watch::Receiver<ShutdownSignal>,
) -> Pause {
    let sleep = time::sleep(duration);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return Pause::Elapsed,
            changed = shutdown.changed() => match changed {
                Ok(()) if shutdown.borrow_and_update().is_requested() => return Pause::Interrupted,
                Ok(()) => continue,
                Err(_) => {
                    (&mut sleep).await;
                    return Pause::Elapsed;
                }
            },
        }
    }
}
