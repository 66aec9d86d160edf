//! Periodic driver for the autoclose sweep.
//!
//! [`AutocloseScheduler`] runs one sweep, sleeps for the interval, and
//! repeats until stopped through its [`SchedulerHandle`]. Stopping takes
//! effect between cycles only: a sweep that has started always runs to
//! completion.
//!
//! ```rust,ignore
//! let scheduler = AutocloseScheduler::new(service, clock, interval)?;
//! let handle = scheduler.start();
//! // ...
//! handle.stop();
//! handle.join().await?;
//! ```

use super::report::SweepReport;
use super::sweep::AutocloseService;
use crate::task::ports::TaskRepository;
use mockable::Clock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Invalid scheduler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerConfigError {
    /// The sweep interval is zero.
    #[error("autoclose interval must be greater than zero")]
    ZeroInterval,
}

/// Lifecycle state of the scheduler loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// Waiting for the next cycle.
    #[default]
    Idle,
    /// A sweep is in progress.
    Running,
    /// The loop has exited and will not sweep again.
    Stopped,
}

impl SchedulerState {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot published by the scheduler after every state change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    /// Current loop state.
    pub state: SchedulerState,
    /// Number of cycles that have finished, successful or not.
    pub cycles: u64,
    /// Report of the most recent successful sweep.
    pub last_report: Option<SweepReport>,
}

/// Runs [`AutocloseService::run_sweep`] on a fixed interval.
pub struct AutocloseScheduler<T, C>
where
    T: TaskRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    service: Arc<AutocloseService<T>>,
    clock: Arc<C>,
    interval: Duration,
}

impl<T, C> AutocloseScheduler<T, C>
where
    T: TaskRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a scheduler that sweeps every `interval`, reading `now` from
    /// `clock` at the start of each cycle.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerConfigError::ZeroInterval`] for a zero interval.
    pub fn new(
        service: Arc<AutocloseService<T>>,
        clock: Arc<C>,
        interval: Duration,
    ) -> Result<Self, SchedulerConfigError> {
        if interval.is_zero() {
            return Err(SchedulerConfigError::ZeroInterval);
        }
        Ok(Self {
            service,
            clock,
            interval,
        })
    }

    /// Spawns the loop on the current tokio runtime.
    #[must_use]
    pub fn start(self) -> SchedulerHandle {
        self.start_with_cancellation(CancellationToken::new())
    }

    /// Spawns the loop, stopping it when `cancel` is cancelled as well as
    /// through the returned handle.
    #[must_use]
    pub fn start_with_cancellation(self, cancel: CancellationToken) -> SchedulerHandle {
        let (status_tx, status_rx) = watch::channel(SchedulerStatus::default());
        let task = tokio::spawn(self.run(cancel.clone(), status_tx));
        SchedulerHandle {
            cancel,
            status: status_rx,
            task,
        }
    }

    async fn run(self, cancel: CancellationToken, status: watch::Sender<SchedulerStatus>) {
        info!(interval = ?self.interval, "autoclose scheduler started");

        while !cancel.is_cancelled() {
            status.send_modify(|current| current.state = SchedulerState::Running);
            let now = self.clock.utc();
            let outcome = self.service.run_sweep(now).await;

            status.send_modify(|current| {
                current.state = SchedulerState::Idle;
                current.cycles += 1;
                match outcome {
                    Ok(report) => {
                        if !report.is_clean() {
                            warn!(
                                failed = report.failures().len(),
                                "autoclose cycle finished with failures"
                            );
                        }
                        current.last_report = Some(report);
                    }
                    Err(ref err) => {
                        error!(error = %err, "autoclose cycle failed, retrying next cycle");
                    }
                }
            });

            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        status.send_modify(|current| current.state = SchedulerState::Stopped);
        info!("autoclose scheduler stopped");
    }
}

/// Control handle for a running [`AutocloseScheduler`].
#[derive(Debug)]
pub struct SchedulerHandle {
    cancel: CancellationToken,
    status: watch::Receiver<SchedulerStatus>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Requests the loop to stop before its next cycle.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Returns the current loop state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.status.borrow().state
    }

    /// Returns a snapshot of the latest published status.
    #[must_use]
    pub fn status(&self) -> SchedulerStatus {
        self.status.borrow().clone()
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SchedulerStatus> {
        self.status.clone()
    }

    /// Waits for the loop to exit.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] when the loop task panicked or was aborted.
    pub async fn join(self) -> Result<(), JoinError> {
        self.task.await
    }

    /// Stops the loop and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] when the loop task panicked or was aborted.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        self.stop();
        self.join().await
    }
}
