//! Error types for project domain validation.

use thiserror::Error;

/// Errors returned while constructing domain project values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectDomainError {
    /// The project name is empty after trimming.
    #[error("project name must not be empty")]
    EmptyName,

    /// The project name has more words than allowed.
    #[error("project name cannot exceed {max} words, found {found}")]
    NameTooLong {
        /// Maximum permitted word count.
        max: usize,
        /// Actual word count.
        found: usize,
    },

    /// The project description has more words than allowed.
    #[error("project description cannot exceed {max} words, found {found}")]
    DescriptionTooLong {
        /// Maximum permitted word count.
        max: usize,
        /// Actual word count.
        found: usize,
    },
}
