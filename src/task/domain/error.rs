//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title has more words than allowed.
    #[error("task title cannot exceed {max} words, found {found}")]
    TitleTooLong {
        /// Maximum permitted word count.
        max: usize,
        /// Actual word count.
        found: usize,
    },

    /// The task description is empty after trimming.
    #[error("task description must not be empty")]
    EmptyDescription,

    /// The task description has more words than allowed.
    #[error("task description cannot exceed {max} words, found {found}")]
    DescriptionTooLong {
        /// Maximum permitted word count.
        max: usize,
        /// Actual word count.
        found: usize,
    },

    /// The deadline is not a `YYYY-MM-DD` calendar date.
    #[error("invalid deadline '{0}', expected YYYY-MM-DD")]
    InvalidDeadline(String),
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
