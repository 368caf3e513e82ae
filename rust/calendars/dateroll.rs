use chrono::prelude::*;
use chrono::{Duration, Months};

/// Number of days in one year step when rolling dated items into a taxonomy span.
pub const YEAR_DAYS: i64 = 365;

/// Shift dates by whole model years so that they land inside a recurring annual span.
///
/// The span is half open, `[span_start, span_end)`. Farm calendars repeat every year, so a
/// dated item given in any year is compared against a span after moving it by multiples of
/// [`YEAR_DAYS`].
pub trait YearRoll {
    /// First day of the span.
    fn span_start(&self) -> NaiveDate;

    /// Exclusive last day of the span.
    fn span_end(&self) -> NaiveDate;

    /// Returns whether the date lies inside the span without shifting.
    fn in_span(&self, date: &NaiveDate) -> bool {
        self.span_start() <= *date && *date < self.span_end()
    }

    /// Number of whole years `date` must move forward to reach the span start. Zero if it is
    /// already on or after the start.
    fn years_forward(&self, date: &NaiveDate) -> i64 {
        let gap = (self.span_start() - *date).num_days();
        if gap <= 0 {
            0
        } else {
            (gap + YEAR_DAYS - 1) / YEAR_DAYS
        }
    }

    /// Number of whole years `date` must move backward to fall before the span end. Zero if it
    /// is already before the end.
    fn years_backward(&self, date: &NaiveDate) -> i64 {
        let over = (*date - self.span_end()).num_days() + 1;
        if over <= 0 {
            0
        } else {
            (over + YEAR_DAYS - 1) / YEAR_DAYS
        }
    }

    /// Move `date` by the smallest number of whole years, forward or backward, that places it in
    /// the span.
    ///
    /// Returns `None` if the span is shorter than a year and the date falls in the gap.
    fn roll_into_span(&self, date: &NaiveDate) -> Option<NaiveDate> {
        let shift = self.years_forward(date) - self.years_backward(date);
        let rolled = *date + Duration::days(shift * YEAR_DAYS);
        if self.in_span(&rolled) {
            Some(rolled)
        } else {
            None
        }
    }
}

/// Move `date` by whole calendar years. A 29 February lands on 28 February in a common year.
///
/// Saturates at the limits of [`NaiveDate`].
pub fn add_years(date: &NaiveDate, years: i32) -> NaiveDate {
    let months = Months::new(12 * years.unsigned_abs());
    if years >= 0 {
        date.checked_add_months(months).unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_months(months).unwrap_or(NaiveDate::MIN)
    }
}

/// A single model year starting on a given date, e.g. the season break.
///
/// The year is the calendar year `[start, start + 12 months)`, 366 days long when it contains a
/// 29 February.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BaseYear {
    pub start: NaiveDate,
}

impl BaseYear {
    pub fn new(start: NaiveDate) -> Self {
        BaseYear { start }
    }

    /// Exclusive end of the year.
    pub fn end(&self) -> NaiveDate {
        add_years(&self.start, 1)
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.start <= *date && *date < self.end()
    }

    /// Move a date by whole calendar years into the base year.
    pub fn adjust(&self, date: &NaiveDate) -> NaiveDate {
        let shifted = add_years(date, self.start.year() - date.year());
        if shifted < self.start {
            add_years(date, self.start.year() - date.year() + 1)
        } else {
            shifted
        }
    }
}
