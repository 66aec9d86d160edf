//! Calendar deadlines and the overdue comparison.

use super::TaskDomainError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Input format accepted for deadlines.
const DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// Calendar date by which a task is due.
///
/// A deadline denotes the instant at the start of its day in UTC. A task with
/// this deadline is overdue once that instant lies strictly in the past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deadline(NaiveDate);

impl Deadline {
    /// Wraps a calendar date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parses a `YYYY-MM-DD` deadline.
    ///
    /// Blank input yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidDeadline`] when the value is not a
    /// valid calendar date in that format.
    pub fn parse(value: &str) -> Result<Option<Self>, TaskDomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(trimmed, DEADLINE_FORMAT)
            .map(|date| Some(Self(date)))
            .map_err(|_| TaskDomainError::InvalidDeadline(value.to_owned()))
    }

    /// Returns the calendar date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    /// Returns the instant this deadline denotes.
    #[must_use]
    pub fn starts_at(self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::MIN).and_utc()
    }

    /// Returns whether the deadline lies strictly before `now`.
    #[must_use]
    pub fn is_passed_at(self, now: DateTime<Utc>) -> bool {
        self.starts_at() < now
    }

    /// Returns the latest calendar date whose deadline has passed at `now`.
    ///
    /// Every deadline on or before the returned date satisfies
    /// [`Self::is_passed_at`]; this lets stores express the overdue predicate
    /// as a date comparison.
    #[must_use]
    pub fn latest_passed_date(now: DateTime<Utc>) -> Option<NaiveDate> {
        let today = now.date_naive();
        if now.time() == NaiveTime::MIN {
            today.pred_opt()
        } else {
            Some(today)
        }
    }
}

impl From<NaiveDate> for Deadline {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DEADLINE_FORMAT))
    }
}
