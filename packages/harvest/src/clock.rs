//! Source of "today" for date-range resolution.

use chrono::NaiveDate;

/// Supplies the current calendar date.
pub trait Clock: Send + Sync {
    /// Today's date.
    fn today(&self) -> NaiveDate;
}

/// The local calendar date of the machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
