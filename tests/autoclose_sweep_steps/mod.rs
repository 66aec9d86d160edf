//! Step definitions for autoclose sweep scenarios.

pub mod when;
