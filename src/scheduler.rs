//! Fixed-interval driver for the polling loop.
//!
//! Time enters only through a [`Ticker`], so the loop can be exercised with
//! synthetic ticks. Shutdown goes through a [`CancellationToken`].

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// One unit of periodic work.
pub trait Cycle {
    async fn run_cycle(&mut self);
}

/// Source of "time to poll" signals.
pub trait Ticker {
    /// Wait for the next tick. `false` means the ticker is exhausted.
    async fn tick(&mut self) -> bool;
}

/// Wall-clock ticker. The first tick fires immediately.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        // A slow cycle pushes the schedule back instead of bursting.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Run `cycle` on every tick until cancelled or the ticker runs out.
///
/// Returns the number of cycles that ran. A cycle already in progress when
/// the token is cancelled is allowed to finish.
pub async fn run<W: Cycle, T: Ticker>(
    work: &mut W,
    ticker: &mut T,
    cancel: &CancellationToken,
) -> u64 {
    let mut cycles = 0;
    loop {
        let ticked = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            ticked = ticker.tick() => ticked,
        };
        if !ticked {
            break;
        }
        work.run_cycle().await;
        cycles += 1;
    }
    tracing::info!(cycles, "polling loop stopped");
    cycles
}
