//! Fixed-interval scheduler for scrape cycles
//!
//! This module handles:
//! - Running one cycle per interval tick, strictly one at a time
//! - Sleeping for the remainder of the interval after each cycle
//! - Stopping on an external signal, at a cycle boundary or during the sleep
//!
//! A failed cycle never stops the loop. Only a fatal error from the cycle
//! (a broken fetcher setup) ends it early.

use crate::output::Emitter;
use crate::scraper::cycle::ScrapeCycle;
use crate::scraper::fetcher::PageFetcher;
use crate::state::{CycleStatus, SchedulerState};
use crate::OddsError;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

/// Counts of cycles run by [`Scheduler::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    pub cycles: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl SchedulerReport {
    fn record(&mut self, status: CycleStatus) {
        self.cycles += 1;
        match status {
            CycleStatus::Succeeded => self.succeeded += 1,
            CycleStatus::Failed => self.failed += 1,
        }
    }
}

/// Drives a [`ScrapeCycle`] at a fixed interval until told to stop
///
/// The interval is measured between cycle starts; a cycle that overruns it
/// is followed immediately by the next one.
pub struct Scheduler<F, E> {
    cycle: ScrapeCycle<F, E>,
    interval: Duration,
    state: SchedulerState,
}

impl<F: PageFetcher, E: Emitter> Scheduler<F, E> {
    /// Creates a new scheduler in the `Idle` state
    ///
    /// # Arguments
    ///
    /// * `cycle` - The cycle to run on every tick
    /// * `interval` - Time between cycle starts
    pub fn new(cycle: ScrapeCycle<F, E>, interval: Duration) -> Self {
        Self {
            cycle,
            interval,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Consumes the scheduler, returning the cycle (and with it the fetcher)
    pub fn into_cycle(self) -> ScrapeCycle<F, E> {
        self.cycle
    }

    fn transition(&mut self, next: SchedulerState) -> Result<(), OddsError> {
        if !self.state.can_transition_to(next) {
            return Err(OddsError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("Scheduler {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs cycles until `shutdown` carries `true`
    ///
    /// The signal is checked before and after every cycle and while
    /// sleeping; a cycle in progress always runs to completion.
    ///
    /// # Returns
    ///
    /// * `Ok(SchedulerReport)` - Stopped by the signal
    /// * `Err(OddsError)` - A cycle failed fatally, or the scheduler was already used
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<SchedulerReport, OddsError> {
        self.transition(SchedulerState::Running)?;
        tracing::info!(
            "Scheduler started: polling {} every {:?}",
            self.cycle.url(),
            self.interval
        );

        let mut report = SchedulerReport::default();

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let started = Instant::now();
            let result = match self.cycle.run_once().await {
                Ok(result) => result,
                Err(e) => {
                    self.transition(SchedulerState::Stopped)?;
                    tracing::error!("Scheduler stopped after fatal error: {}", e);
                    return Err(e);
                }
            };
            report.record(result.status);

            if *shutdown.borrow_and_update() {
                break;
            }

            self.transition(SchedulerState::Sleeping)?;
            let wake_at = started + self.interval;
            tracing::debug!(
                "Cycle {}, next in {:?}",
                result.status,
                wake_at.saturating_duration_since(Instant::now())
            );

            let stopped = tokio::select! {
                _ = sleep_until(wake_at) => false,
                _ = wait_for_stop(&mut shutdown) => true,
            };
            if stopped {
                break;
            }
            self.transition(SchedulerState::Running)?;
        }

        self.transition(SchedulerState::Stopped)?;
        tracing::info!(
            "Scheduler stopped: {} cycles ({} succeeded, {} failed)",
            report.cycles,
            report.succeeded,
            report.failed
        );
        Ok(report)
    }
}

/// Resolves once the signal carries `true`; never resolves if the sender is gone
async fn wait_for_stop(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
