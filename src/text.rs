//! Word-count checks shared by project and task text fields.

use std::ops::RangeInclusive;

/// Counts whitespace-separated words in `value`.
#[must_use]
pub fn word_count(value: &str) -> usize {
    value.split_whitespace().count()
}

/// Returns the word count when it falls inside `limits`, or `Err(count)`
/// otherwise.
///
/// # Errors
///
/// Returns the out-of-range word count.
pub fn check_word_limits(value: &str, limits: &RangeInclusive<usize>) -> Result<usize, usize> {
    let count = word_count(value);
    if limits.contains(&count) {
        Ok(count)
    } else {
        Err(count)
    }
}
