//! Overdue-task autoclose.
//!
//! A sweep selects every task whose deadline has passed at a given `now` and
//! is not yet `done`, then closes each one with a conditional write so that
//! concurrent user edits are never overwritten. [`AutocloseService`] runs a
//! single sweep; [`AutocloseScheduler`] repeats it on an interval.

mod report;
mod scheduler;
mod sweep;

pub use report::{CloseFailure, CloseFailureReason, SweepReport};
pub use scheduler::{
    AutocloseScheduler, SchedulerConfigError, SchedulerHandle, SchedulerState, SchedulerStatus,
};
pub use sweep::{AutocloseService, SweepError};

#[cfg(test)]
mod tests;
