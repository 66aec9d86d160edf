//! Task aggregate root and validated text fields.

use super::{Deadline, TaskDomainError, TaskId, TaskStatus};
use crate::project::domain::ProjectId;
use crate::text::check_word_limits;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Validated task title of one to thirty words.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Permitted word count range.
    pub const WORD_LIMITS: RangeInclusive<usize> = 1..=30;

    /// Creates a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] for blank input and
    /// [`TaskDomainError::TitleTooLong`] above the word limit.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        check_word_limits(trimmed, &Self::WORD_LIMITS).map_err(|found| {
            TaskDomainError::TitleTooLong {
                max: *Self::WORD_LIMITS.end(),
                found,
            }
        })?;
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated, required task description of at most 150 words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskDescription(String);

impl TaskDescription {
    /// Permitted word count range.
    pub const WORD_LIMITS: RangeInclusive<usize> = 1..=150;

    /// Creates a validated description.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyDescription`] for blank input and
    /// [`TaskDomainError::DescriptionTooLong`] above the word limit.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyDescription);
        }
        check_word_limits(trimmed, &Self::WORD_LIMITS).map_err(|found| {
            TaskDomainError::DescriptionTooLong {
                max: *Self::WORD_LIMITS.end(),
                found,
            }
        })?;
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the description as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parameter object for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Owning project.
    pub project_id: ProjectId,
    /// Task title.
    pub title: TaskTitle,
    /// Task description.
    pub description: TaskDescription,
    /// Optional deadline.
    pub deadline: Option<Deadline>,
    /// Initial status.
    pub status: TaskStatus,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    title: TaskTitle,
    description: TaskDescription,
    status: TaskStatus,
    deadline: Option<Deadline>,
    closed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owning project.
    pub project_id: ProjectId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: TaskDescription,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted deadline, if any.
    pub deadline: Option<Deadline>,
    /// Persisted close timestamp, if any.
    pub closed_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task.
    ///
    /// A task created directly as `done` is stamped closed at creation time.
    #[must_use]
    pub fn new(new_task: NewTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        let closed_at = new_task.status.is_done().then_some(timestamp);
        Self {
            id: TaskId::new(),
            project_id: new_task.project_id,
            title: new_task.title,
            description: new_task.description,
            status: new_task.status,
            deadline: new_task.deadline,
            closed_at,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            status: data.status,
            deadline: data.deadline,
            closed_at: data.closed_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the task description.
    #[must_use]
    pub const fn description(&self) -> &TaskDescription {
        &self.description
    }

    /// Returns the task status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Deadline> {
        self.deadline
    }

    /// Returns when the task was closed, if it is `done`.
    #[must_use]
    pub const fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the task is eligible for autoclose at `now`: it has a
    /// deadline strictly before `now` and is not `done`.
    #[must_use]
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_done()
            && self
                .deadline
                .is_some_and(|deadline| deadline.is_passed_at(now))
    }

    /// Replaces the title.
    pub fn retitle(&mut self, title: TaskTitle, clock: &impl Clock) {
        self.title = title;
        self.touch(clock);
    }

    /// Replaces the description.
    pub fn describe(&mut self, description: TaskDescription, clock: &impl Clock) {
        self.description = description;
        self.touch(clock);
    }

    /// Replaces or clears the deadline.
    pub fn reschedule(&mut self, deadline: Option<Deadline>, clock: &impl Clock) {
        self.deadline = deadline;
        self.touch(clock);
    }

    /// Applies a user-initiated status change.
    ///
    /// Entering `done` stamps `closed_at` unless it is already set; leaving
    /// `done` clears it.
    pub fn set_status(&mut self, status: TaskStatus, clock: &impl Clock) {
        let timestamp = clock.utc();
        if status.is_done() {
            self.closed_at.get_or_insert(timestamp);
        } else {
            self.closed_at = None;
        }
        self.status = status;
        self.updated_at = timestamp;
    }

    /// Closes the task at `closed_at` unless it is already `done`.
    ///
    /// Returns whether the transition applied. A `done` task keeps the
    /// `closed_at` it already has.
    pub fn close_if_not_done(&mut self, closed_at: DateTime<Utc>) -> bool {
        if self.status.is_done() {
            return false;
        }
        self.status = TaskStatus::Done;
        self.closed_at = Some(closed_at);
        self.updated_at = closed_at;
        true
    }

    /// Returns whether the title or description contains `needle`,
    /// ignoring case.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let lowered = needle.to_lowercase();
        self.title.as_str().to_lowercase().contains(&lowered)
            || self.description.as_str().to_lowercase().contains(&lowered)
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
