//! Task management.
//!
//! Tasks belong to a project, carry an optional calendar deadline, and move
//! between `todo`, `in_progress`, and `done`. The repository port exposes the
//! overdue query and the guarded close used by [`crate::autoclose`]. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
