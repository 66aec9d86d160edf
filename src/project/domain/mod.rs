//! Domain model for projects.
//!
//! A project groups tasks under a unique, validated name.

mod error;
mod ids;
mod project;

pub use error::ProjectDomainError;
pub use ids::ProjectId;
pub use project::{PersistedProjectData, Project, ProjectDescription, ProjectName};
