//! Per-sweep outcome reporting.

use crate::task::domain::TaskId;
use crate::task::ports::TaskRepositoryError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;

/// Why closing a single overdue task failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CloseFailureReason {
    /// The store rejected or failed the conditional update.
    #[error("persistence failure: {message}")]
    Persistence {
        /// Rendered store error.
        message: String,
    },

    /// The store did not answer within the configured timeout.
    #[error("store call timed out after {timeout_ms}ms")]
    TimedOut {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },
}

impl CloseFailureReason {
    pub(crate) fn persistence(err: &TaskRepositoryError) -> Self {
        Self::Persistence {
            message: err.to_string(),
        }
    }

    pub(crate) fn timed_out(timeout: Duration) -> Self {
        Self::TimedOut {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// A task the sweep attempted and failed to close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseFailure {
    /// Task that could not be closed.
    pub task_id: TaskId,
    /// Failure cause.
    pub reason: CloseFailureReason,
}

/// Outcome of one autoclose sweep.
///
/// Every candidate returned by the overdue selection ends up in exactly one
/// of `closed`, `skipped`, or `failed`, in selection order. The serialized
/// form also carries `closed_count` and `failed_ids`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    now: DateTime<Utc>,
    closed: Vec<TaskId>,
    skipped: Vec<TaskId>,
    failed: Vec<CloseFailure>,
}

impl SweepReport {
    pub(crate) const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            closed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub(crate) fn record_closed(&mut self, task_id: TaskId) {
        self.closed.push(task_id);
    }

    pub(crate) fn record_skipped(&mut self, task_id: TaskId) {
        self.skipped.push(task_id);
    }

    pub(crate) fn record_failure(&mut self, task_id: TaskId, reason: CloseFailureReason) {
        self.failed.push(CloseFailure { task_id, reason });
    }

    /// Returns the instant the sweep selected and closed against.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Returns the tasks this sweep closed.
    #[must_use]
    pub fn closed(&self) -> &[TaskId] {
        &self.closed
    }

    /// Returns the tasks that were already `done` when the close was applied.
    #[must_use]
    pub fn skipped(&self) -> &[TaskId] {
        &self.skipped
    }

    /// Returns the per-task failures.
    #[must_use]
    pub fn failures(&self) -> &[CloseFailure] {
        &self.failed
    }

    /// Returns how many tasks this sweep closed.
    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }

    /// Returns the identifiers of the tasks that failed to close.
    #[must_use]
    pub fn failed_ids(&self) -> Vec<TaskId> {
        self.failed.iter().map(|failure| failure.task_id).collect()
    }

    /// Returns how many candidates the selection produced.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.closed.len() + self.skipped.len() + self.failed.len()
    }

    /// Returns whether no candidate failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Serialize)]
struct SweepReportView<'a> {
    now: DateTime<Utc>,
    closed_count: usize,
    failed_ids: Vec<TaskId>,
    closed: &'a [TaskId],
    skipped: &'a [TaskId],
    failed: &'a [CloseFailure],
}

impl Serialize for SweepReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SweepReportView {
            now: self.now,
            closed_count: self.closed_count(),
            failed_ids: self.failed_ids(),
            closed: &self.closed,
            skipped: &self.skipped,
            failed: &self.failed,
        }
        .serialize(serializer)
    }
}
