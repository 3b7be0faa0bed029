//! Calendar period (year, month) identifying a workload bucket.

use std::fmt;

use chrono::{Datelike, NaiveDateTime};

use crate::error::DomainError;

const MONTH_NAMES: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

/// A calendar month of a given year. Ordered by `(year, month)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period from raw parts.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `year < 1` or `month` is outside
    /// `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self, DomainError> {
        if year < 1 {
            return Err(DomainError::Validation(format!(
                "year must be at least 1, got {year}"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(DomainError::Validation(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Derives the period a training date falls into.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for dates before year 1.
    pub fn from_training_date(date: NaiveDateTime) -> Result<Self, DomainError> {
        Self::new(date.year(), date.month())
    }

    /// The calendar year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month number, `1..=12`.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Upper-case English month name, e.g. `JANUARY`.
    #[must_use]
    pub fn month_name(&self) -> &'static str {
        // month is validated to 1..=12 at construction.
        MONTH_NAMES[(self.month - 1) as usize]
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_new_rejects_month_out_of_range() {
        assert!(matches!(Period::new(2025, 0), Err(DomainError::Validation(_))));
        assert!(matches!(Period::new(2025, 13), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_new_rejects_year_zero() {
        assert!(matches!(Period::new(0, 1), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_from_training_date_takes_year_and_month() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();

        let period = Period::from_training_date(date).unwrap();

        assert_eq!(period.year(), 2025);
        assert_eq!(period.month(), 1);
        assert_eq!(period.month_name(), "JANUARY");
    }

    #[test]
    fn test_ordering_is_year_then_month() {
        let dec_2024 = Period::new(2024, 12).unwrap();
        let jan_2025 = Period::new(2025, 1).unwrap();
        let feb_2025 = Period::new(2025, 2).unwrap();

        assert!(dec_2024 < jan_2025);
        assert!(jan_2025 < feb_2025);
    }

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(Period::new(2025, 3).unwrap().to_string(), "2025-03");
        assert_eq!(Period::new(2024, 12).unwrap().month_name(), "DECEMBER");
    }
}
