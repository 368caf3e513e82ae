use chrono::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calendars::taxonomy::PeriodTaxonomy;
use crate::json::JSON;

/// The period taxonomies used by the model.
///
/// - `phase`: rotation phase periods (`m`), in which rotation phases may be selected.
/// - `season`: season / cashflow periods (`p7`), used for within-year season transfers.
/// - `labour`: labour periods (`p5`), used to time-bucket labour requirements.
///
/// Pure data; allocation and season logic live in [`crate::allocation`] and [`crate::seasons`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarPeriods {
    pub phase: PeriodTaxonomy,
    pub season: PeriodTaxonomy,
    pub labour: PeriodTaxonomy,
}

impl JSON for CalendarPeriods {}

impl CalendarPeriods {
    /// Look up a taxonomy by its name.
    pub fn by_name(&self, name: &str) -> Option<&PeriodTaxonomy> {
        [&self.phase, &self.season, &self.labour]
            .into_iter()
            .find(|t| t.name() == name)
    }
}

/// Create a `NaiveDate` with limited but sufficient inputs.
///
/// Panics on an invalid date; intended for constants and tests.
pub fn nd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Boundaries of `n` consecutive blocks of `days` days starting at `start`.
pub fn blocks(start: NaiveDate, days: i64, n: usize) -> Vec<NaiveDate> {
    (0..=n as i64)
        .map(|i| start + chrono::Duration::days(i * days))
        .collect()
}
