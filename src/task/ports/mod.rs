//! Port contracts for task management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services and
//! the autoclose sweep.

pub mod repository;

pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
