//! Unit tests for the autoclose sweep and scheduler.

mod helpers;
