//! Allocate dated items into period taxonomies.
//!
//! A [`PeriodAllocator`] distributes items such as a fertiliser application window, a cashflow
//! or a labour job into the periods of a [`PeriodTaxonomy`](crate::calendars::PeriodTaxonomy) in
//! proportion to the days that fall in each period. [`increment_adjust`] converts a per-period
//! requirement into the commitment incurred to date, used for phases selected part way through
//! the year.
//!
//! ### Example
//! ```rust
//! # use farm_rotations::calendars::{nd, blocks, PeriodTaxonomy};
//! # use farm_rotations::allocation::PeriodAllocator;
//! let tax = PeriodTaxonomy::try_new("p5", blocks(nd(2021, 1, 1), 10, 4)).unwrap();
//! let alloc = PeriodAllocator::new(&tax).allocate(&nd(2021, 1, 6), 20).unwrap();
//! assert_eq!(alloc.to_vec(), vec![0.25, 0.5, 0.25, 0.0]);
//! ```

mod allocator;
mod commitment;

#[cfg(feature = "python")]
pub(crate) mod allocator_py;

pub use crate::allocation::{
    allocator::{AllocationTable, DatedItem, PeriodAllocator, ALLOCATION_TOLERANCE},
    commitment::{cumulative_commitment, increment_adjust},
};
