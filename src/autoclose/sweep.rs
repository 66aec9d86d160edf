//! The autoclose sweep: select overdue tasks and close each one.

use super::report::{CloseFailureReason, SweepReport};
use crate::config::AutocloseConfig;
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Errors that abort a whole sweep.
///
/// Per-task failures never surface here; they are recorded in the
/// [`SweepReport`].
#[derive(Debug, Error)]
pub enum SweepError {
    /// The overdue selection query failed.
    #[error("overdue task selection failed: {0}")]
    Selection(#[source] TaskRepositoryError),

    /// The overdue selection query did not answer in time.
    #[error("overdue task selection timed out after {0:?}")]
    SelectionTimedOut(Duration),
}

/// Runs autoclose sweeps against a task store.
///
/// Sweeps through one service never overlap: a second caller waits for the
/// sweep in progress to finish before selecting.
pub struct AutocloseService<T>
where
    T: TaskRepository,
{
    tasks: Arc<T>,
    store_timeout: Duration,
    sweep_lock: Mutex<()>,
}

impl<T> AutocloseService<T>
where
    T: TaskRepository,
{
    /// Creates a service bounding every store call by `store_timeout`.
    #[must_use]
    pub fn new(tasks: Arc<T>, store_timeout: Duration) -> Self {
        Self {
            tasks,
            store_timeout,
            sweep_lock: Mutex::new(()),
        }
    }

    /// Creates a service from the `[autoclose]` configuration section.
    #[must_use]
    pub fn from_config(tasks: Arc<T>, config: &AutocloseConfig) -> Self {
        Self::new(tasks, config.store_timeout())
    }

    /// Returns the per-call store timeout.
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Closes every task overdue at `now`, stamping `closed_at = now`.
    ///
    /// Each close is conditional on the task not being `done` when the write
    /// lands; a task completed concurrently is reported as skipped. A failed
    /// or timed-out close is recorded and the sweep moves on to the next
    /// candidate. Re-running with the same `now` closes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Selection`] or [`SweepError::SelectionTimedOut`]
    /// when the overdue selection itself fails; nothing is written in that
    /// case.
    pub async fn run_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, SweepError> {
        let _guard = self.sweep_lock.lock().await;
        debug!(%now, "autoclose sweep started");

        let candidates = match timeout(self.store_timeout, self.tasks.find_overdue(now)).await {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(err)) => return Err(SweepError::Selection(err)),
            Err(_) => return Err(SweepError::SelectionTimedOut(self.store_timeout)),
        };

        let mut report = SweepReport::new(now);
        for task in candidates {
            let task_id = task.id();
            match timeout(
                self.store_timeout,
                self.tasks.close_if_not_done(task_id, now),
            )
            .await
            {
                Ok(Ok(true)) => report.record_closed(task_id),
                Ok(Ok(false)) => {
                    debug!(%task_id, "task already done, skipping");
                    report.record_skipped(task_id);
                }
                Ok(Err(err)) => {
                    warn!(%task_id, error = %err, "failed to close overdue task");
                    report.record_failure(task_id, CloseFailureReason::persistence(&err));
                }
                Err(_) => {
                    warn!(
                        %task_id,
                        timeout = ?self.store_timeout,
                        "closing overdue task timed out"
                    );
                    report.record_failure(task_id, CloseFailureReason::timed_out(self.store_timeout));
                }
            }
        }

        info!(
            %now,
            closed = report.closed_count(),
            skipped = report.skipped().len(),
            failed = report.failures().len(),
            "autoclose sweep finished"
        );
        Ok(report)
    }
}
