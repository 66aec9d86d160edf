//! Project management.
//!
//! Projects are the containers tasks belong to. Names are unique and both
//! name and description are word-count validated. The module follows the same
//! hexagonal layout as [`crate::task`]:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
