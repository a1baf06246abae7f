//! Business-day calendar arithmetic
//!
//! A business day is a weekday (Monday-Friday) that is not in the supplied
//! [`HolidaySet`]. Counting is inclusive on both ends.

pub mod loader;

pub use loader::{
    load_holidays, load_holidays_from_reader, read_holiday_rows, Holiday, DEFAULT_HOLIDAYS_PATH,
};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of non-business dates beyond weekends
///
/// Built once by the caller and shared read-only across grid evaluations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    /// Empty calendar: only weekends are non-business days
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate) -> bool {
        self.dates.insert(date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    /// Whether `date` is neither a weekend nor a listed holiday
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.contains(date)
    }

    /// Count business days in the closed interval `[start, end]`
    ///
    /// Returns 0 when `end < start`.
    pub fn business_days_between(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        if end < start {
            return 0;
        }

        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.is_business_day(*day))
            .count() as u32
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}

impl Extend<NaiveDate> for HolidaySet {
    fn extend<I: IntoIterator<Item = NaiveDate>>(&mut self, iter: I) {
        self.dates.extend(iter);
    }
}

/// Free-function form of [`HolidaySet::business_days_between`]
pub fn business_days_between(start: NaiveDate, end: NaiveDate, holidays: &HolidaySet) -> u32 {
    holidays.business_days_between(start, end)
}
