//! Period taxonomies and annual date rolling.
//!
//! Every dated quantity in the farm model (a fertiliser application, a sale, a labour job) is
//! bucketed into one of several **period taxonomies**: the rotation phase periods, the
//! season/cashflow periods and the labour periods. A [`PeriodTaxonomy`] is a strictly increasing
//! list of boundary dates; [`CalendarPeriods`] groups the taxonomies a model run uses.
//!
//! The farm year recurs, so an item given in any calendar year is compared against a taxonomy
//! after shifting it by whole model years, see [`YearRoll`].
//!
//! ### Example
//! ```rust
//! # use farm_rotations::calendars::{nd, PeriodTaxonomy, YearRoll};
//! let tax = PeriodTaxonomy::try_new(
//!     "m",
//!     vec![nd(2021, 4, 1), nd(2021, 6, 1), nd(2021, 10, 1), nd(2022, 4, 1)],
//! ).unwrap();
//! // A date in the 2019 season lands in the second period once rolled into the span.
//! let rolled = tax.roll_into_span(&nd(2019, 7, 14)).unwrap();
//! assert_eq!(tax.period_of(&rolled), Some(1));
//! ```

mod calendar;
mod dateroll;
mod taxonomy;

pub use crate::calendars::{
    calendar::{blocks, nd, CalendarPeriods},
    dateroll::{add_years, BaseYear, YearRoll, YEAR_DAYS},
    taxonomy::PeriodTaxonomy,
};
