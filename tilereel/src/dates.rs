//! Calendar day enumeration.
//!
//! Produces the ordered, inclusive sequence of days an animation covers.
//! Frame N of every clip corresponds to day N of this sequence.

use chrono::{Days, NaiveDate};
use std::fmt;
use thiserror::Error;

/// Date format used for tile URLs, file names and requests.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors from date parsing and range enumeration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DateRangeError {
    /// Input is not a `YYYY-MM-DD` calendar date
    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// End date precedes start date
    #[error("Invalid range: end date {end} precedes start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Parses a `YYYY-MM-DD` string.
pub fn parse_date(value: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| DateRangeError::InvalidDate(value.to_string()))
}

/// Ordered sequence of consecutive calendar days, both endpoints included.
///
/// Strictly increasing with no gaps and no duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSequence {
    days: Vec<NaiveDate>,
}

impl DateSequence {
    /// Enumerates every day from `start` to `end` inclusive.
    pub fn enumerate(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if end < start {
            return Err(DateRangeError::InvalidRange { start, end });
        }

        let days = start
            .iter_days()
            .take_while(|day| *day <= end)
            .collect::<Vec<_>>();

        Ok(Self { days })
    }

    /// Parses both endpoints and enumerates the range.
    pub fn from_strs(start: &str, end: &str) -> Result<Self, DateRangeError> {
        Self::enumerate(parse_date(start)?, parse_date(end)?)
    }

    /// Number of days in the range (inclusive day count).
    #[inline]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Always false for a successfully enumerated range.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.days.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.days.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.iter().copied()
    }

    /// Days formatted as `YYYY-MM-DD`.
    pub fn labels(&self) -> Vec<String> {
        self.days.iter().map(|d| format_date(*d)).collect()
    }
}

/// Formats a day as `YYYY-MM-DD`.
pub fn format_date(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

/// Returns the inclusive day count between two dates, or `None` if inverted.
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> Option<u64> {
    if end < start {
        return None;
    }
    Some((end - start).num_days() as u64 + 1)
}

/// Returns the day after `day`, if representable.
pub fn next_day(day: NaiveDate) -> Option<NaiveDate> {
    day.checked_add_days(Days::new(1))
}

impl fmt::Display for DateSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "{}..{} ({} days)",
                format_date(first),
                format_date(last),
                self.len()
            ),
            _ => write!(f, "(empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_single_day_range() {
        let seq = DateSequence::from_strs("2020-01-01", "2020-01-01").unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.labels(), vec!["2020-01-01"]);
    }

    #[test]
    fn test_three_day_range() {
        let seq = DateSequence::from_strs("2020-01-01", "2020-01-03").unwrap();
        assert_eq!(seq.labels(), vec!["2020-01-01", "2020-01-02", "2020-01-03"]);
    }

    #[test]
    fn test_multi_month_range_crosses_leap_day() {
        let seq = DateSequence::from_strs("2020-02-27", "2020-03-02").unwrap();
        assert_eq!(
            seq.labels(),
            vec![
                "2020-02-27",
                "2020-02-28",
                "2020-02-29",
                "2020-03-01",
                "2020-03-02"
            ]
        );
    }

    #[test]
    fn test_inverted_range_fails() {
        let result = DateSequence::from_strs("2020-01-03", "2020-01-01");
        assert!(matches!(result, Err(DateRangeError::InvalidRange { .. })));
    }

    #[test]
    fn test_malformed_date_fails() {
        let result = DateSequence::from_strs("2020-13-01", "2020-12-01");
        assert_eq!(
            result,
            Err(DateRangeError::InvalidDate("2020-13-01".to_string()))
        );
        assert!(parse_date("01/02/2020").is_err());
    }

    #[test]
    fn test_display() {
        let seq = DateSequence::from_strs("2021-06-01", "2021-06-10").unwrap();
        assert_eq!(seq.to_string(), "2021-06-01..2021-06-10 (10 days)");
    }

    #[test]
    fn test_inclusive_day_count() {
        assert_eq!(
            inclusive_day_count(day("2020-01-01"), day("2020-12-31")),
            Some(366)
        );
        assert_eq!(inclusive_day_count(day("2020-01-02"), day("2020-01-01")), None);
    }

    proptest! {
        /// Property: the sequence is strictly increasing, gap-free and sized
        /// to the inclusive day count.
        #[test]
        fn prop_sequence_is_contiguous(start_offset in 0i64..20_000, span in 0i64..800) {
            let base = day("1970-01-01");
            let start = base + chrono::Duration::days(start_offset);
            let end = start + chrono::Duration::days(span);

            let seq = DateSequence::enumerate(start, end).unwrap();
            prop_assert_eq!(seq.len() as i64, span + 1);
            prop_assert_eq!(seq.first(), Some(start));
            prop_assert_eq!(seq.last(), Some(end));

            let days: Vec<_> = seq.iter().collect();
            for pair in days.windows(2) {
                prop_assert_eq!(next_day(pair[0]), Some(pair[1]));
            }
        }
    }
}
