//! Domain model for tasks.
//!
//! Tasks belong to a project, move through the `todo`, `in_progress` and
//! `done` statuses, and may carry a calendar deadline. `closed_at` is kept in
//! step with the `done` status by the aggregate itself.

mod deadline;
mod error;
mod ids;
mod status;
mod task;

pub use deadline::Deadline;
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::TaskId;
pub use status::TaskStatus;
pub use task::{NewTask, PersistedTaskData, Task, TaskDescription, TaskTitle};
