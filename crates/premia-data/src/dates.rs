//! Date parsing and calendar-month arithmetic.
//!
//! All panel dates are month-level: CRSP rows carry the first day of the
//! month and Compustat fiscal year ends are truncated to it before joining.

use crate::error::{DataError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format accepted for every date parameter.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date, naming `param` in the error.
///
/// # Examples
///
/// ```
/// use premia_data::dates::parse_date;
///
/// let date = parse_date("1963-01-01", "start_date").unwrap();
/// assert_eq!(date.to_string(), "1963-01-01");
/// assert!(parse_date("01-01-1963", "start_date").is_err());
/// ```
pub fn parse_date(value: &str, param: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| DataError::InvalidDate {
        param: param.to_string(),
    })
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Shift `date` by `months` calendar months (negative moves backwards).
///
/// The day of month is clamped to the length of the target month, so
/// `2023-01-31 + 1` is `2023-02-28`.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// An inclusive sample window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date of the sample
    pub start: NaiveDate,
    /// Last date of the sample
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting a final date before the start date.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start, "start_date")?, parse_date(end, "final_date")?)
    }

    /// Whether `date` lies inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(1963, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}__{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-02-13", "start_date").unwrap(), d(2024, 2, 13));
    }

    #[rstest]
    #[case("13-02-2024")]
    #[case("2024/02/13")]
    #[case("")]
    #[case("2024-13-01")]
    fn test_parse_date_rejects(#[case] value: &str) {
        let err = parse_date(value, "start_date").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid start_date format. Use 'YYYY-MM-DD'."
        );
    }

    #[test]
    fn test_month_start() {
        assert_eq!(month_start(d(2020, 6, 30)), d(2020, 6, 1));
        assert_eq!(month_start(d(2020, 6, 1)), d(2020, 6, 1));
    }

    #[rstest]
    #[case(d(2020, 6, 1), 6, d(2020, 12, 1))]
    #[case(d(2020, 12, 1), 1, d(2021, 1, 1))]
    #[case(d(2021, 1, 1), -1, d(2020, 12, 1))]
    #[case(d(2023, 1, 31), 1, d(2023, 2, 28))]
    fn test_add_months(#[case] date: NaiveDate, #[case] n: i32, #[case] expected: NaiveDate) {
        assert_eq!(add_months(date, n), expected);
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::parse("1963-01-01", "2023-12-31").unwrap();
        assert_eq!(range.to_string(), "1963-01-01__2023-12-31");
        assert!(range.contains(d(2000, 1, 1)));
        assert!(!range.contains(d(2024, 1, 1)));
        assert_eq!(range, DateRange::default());
    }

    #[test]
    fn test_date_range_rejects_reversed() {
        assert!(matches!(
            DateRange::parse("2023-12-31", "1963-01-01"),
            Err(DataError::InvalidDateRange { .. })
        ));
    }
}
