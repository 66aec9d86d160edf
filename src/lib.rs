//! Tasklane: project and task management with deadline autoclose.
//!
//! Projects group tasks; tasks move through `todo`, `in_progress`, and
//! `done` and may carry a calendar deadline. A background sweep closes every
//! task whose deadline has passed without overwriting concurrent user edits.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//!
//! # Modules
//!
//! - [`project`]: Project validation, storage, and management
//! - [`task`]: Task validation, status workflow, and storage
//! - [`autoclose`]: The overdue sweep and its scheduler
//! - [`config`]: TOML and environment configuration
//! - [`database`]: `PostgreSQL` pool and schema setup

pub mod autoclose;
pub mod config;
pub mod database;
pub mod project;
pub mod task;
mod text;
