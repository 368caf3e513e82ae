use chrono::prelude::*;
use chrono::Duration;
use ndarray::{Array1, Array2, ArrayView1, Axis, Zip};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calendars::{PeriodTaxonomy, YearRoll};
use crate::error::{Error, Result};

/// Tolerance applied when checking that an item's allocation does not exceed its mass.
pub const ALLOCATION_TOLERANCE: f64 = 1e-9;

/// A dated item with an optional duration in days, e.g. a spray application window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatedItem {
    pub start: NaiveDate,
    #[serde(default)]
    pub length: i64,
}

impl DatedItem {
    pub fn new(start: NaiveDate, length: i64) -> Self {
        DatedItem { start, length }
    }

    /// An item occurring on a single date.
    pub fn point(start: NaiveDate) -> Self {
        DatedItem { start, length: 0 }
    }
}

/// Allocation of a batch of items into a taxonomy; axis 0 is the period, axis 1 the item.
#[derive(Clone, Debug, PartialEq)]
pub struct AllocationTable {
    pub taxonomy: String,
    pub keys: Vec<String>,
    pub values: Array2<f64>,
}

impl AllocationTable {
    pub const PERIOD_AXIS: Axis = Axis(0);
    pub const ITEM_AXIS: Axis = Axis(1);

    pub fn n_periods(&self) -> usize {
        self.values.len_of(Self::PERIOD_AXIS)
    }

    pub fn n_items(&self) -> usize {
        self.values.len_of(Self::ITEM_AXIS)
    }

    pub fn get(&self, period: usize, item: usize) -> f64 {
        self.values[[period, item]]
    }

    /// The allocation vector of a single item.
    pub fn item(&self, item: usize) -> ArrayView1<'_, f64> {
        self.values.index_axis(Self::ITEM_AXIS, item)
    }
}

/// Allocates dated, possibly ranged, items into the periods of a [`PeriodTaxonomy`].
///
/// The allocation of an item is the proportion of its day span `[start, start + length)` that
/// intersects each period, after:
///
/// - rolling the start by whole model years into the taxonomy's span,
/// - truncating the span at the first hard boundary after the start and at the end of the
///   taxonomy. The truncated remainder is dropped, so a truncated item allocates less than 1.
///
/// A zero length item is allocated entirely to the period containing its start.
#[derive(Clone, Debug)]
pub struct PeriodAllocator<'a> {
    taxonomy: &'a PeriodTaxonomy,
    hard_boundaries: Vec<NaiveDate>,
}

impl<'a> PeriodAllocator<'a> {
    pub fn new(taxonomy: &'a PeriodTaxonomy) -> Self {
        PeriodAllocator {
            taxonomy,
            hard_boundaries: taxonomy.hard_boundaries.iter().copied().collect(),
        }
    }

    /// Add a hard boundary for this allocator only, e.g. the season break for items which
    /// depend on seeding. The date must be a boundary of the taxonomy.
    pub fn with_hard_boundary(mut self, date: NaiveDate) -> Result<Self> {
        if !self.taxonomy.boundaries().contains(&date) {
            return Err(Error::config(format!(
                "hard boundary {} is not a boundary of period taxonomy `{}`",
                date,
                self.taxonomy.name()
            )));
        }
        if !self.hard_boundaries.contains(&date) {
            self.hard_boundaries.push(date);
            self.hard_boundaries.sort();
        }
        Ok(self)
    }

    pub fn taxonomy(&self) -> &PeriodTaxonomy {
        self.taxonomy
    }

    fn next_hard_boundary(&self, date: &NaiveDate) -> Option<NaiveDate> {
        self.hard_boundaries.iter().find(|d| *d > date).copied()
    }

    /// Proportion of the item falling in each period.
    pub fn allocate(&self, start: &NaiveDate, length: i64) -> Result<Array1<f64>> {
        if length < 0 {
            return Err(Error::config(format!(
                "item starting {} has negative length {}",
                start, length
            )));
        }
        let tax = self.taxonomy;
        let mut alloc = Array1::<f64>::zeros(tax.len());
        let start_ = match tax.roll_into_span(start) {
            Some(d) => d,
            None => {
                warn!(
                    taxonomy = tax.name(),
                    %start,
                    "item start falls outside every period, nothing allocated"
                );
                return Ok(alloc);
            }
        };
        // `roll_into_span` guarantees the start is inside a period
        let first = tax.period_of(&start_).unwrap_or(0);

        if length == 0 {
            alloc[first] = 1.0;
            return Ok(alloc);
        }

        let mut end = start_ + Duration::days(length);
        if let Some(hard) = self.next_hard_boundary(&start_) {
            end = end.min(hard);
        }
        end = end.min(tax.span_end());

        for p in first..tax.len() {
            let lo = start_.max(tax.start(p));
            let hi = end.min(tax.end(p));
            if hi <= lo {
                break;
            }
            alloc[p] = (hi - lo).num_days() as f64 / length as f64;
        }

        let total = alloc.sum();
        if total > 1.0 + ALLOCATION_TOLERANCE {
            return Err(Error::AllocationOverflow {
                taxonomy: tax.name().to_string(),
                start: *start,
                length,
                total,
            });
        }
        Ok(alloc)
    }

    /// Allocate a single [`DatedItem`].
    pub fn allocate_item(&self, item: &DatedItem) -> Result<Array1<f64>> {
        self.allocate(&item.start, item.length)
    }

    /// Allocate a batch of items elementwise.
    ///
    /// `starts` and `lengths` broadcast against each other, so a single length may be applied
    /// to many starts or vice versa. Each element is allocated exactly as by [`allocate`](Self::allocate).
    pub fn allocate_many(
        &self,
        starts: ArrayView1<NaiveDate>,
        lengths: ArrayView1<i64>,
    ) -> Result<AllocationTable> {
        let n = starts.len().max(lengths.len());
        let (starts_, lengths_) = match (starts.broadcast(n), lengths.broadcast(n)) {
            (Some(s), Some(l)) => (s, l),
            _ => {
                return Err(Error::config(format!(
                    "cannot broadcast {} item starts against {} item lengths",
                    starts.len(),
                    lengths.len()
                )))
            }
        };
        let mut values = Array2::<f64>::zeros((self.taxonomy.len(), n));
        let mut result: Result<()> = Ok(());
        Zip::from(values.columns_mut())
            .and(&starts_)
            .and(&lengths_)
            .for_each(|mut column, start, length| {
                if result.is_err() {
                    return;
                }
                match self.allocate(start, *length) {
                    Ok(alloc) => column.assign(&alloc),
                    Err(e) => result = Err(e),
                }
            });
        result?;
        Ok(AllocationTable {
            taxonomy: self.taxonomy.name().to_string(),
            keys: self.taxonomy.keys().to_vec(),
            values,
        })
    }

    /// Allocate a slice of [`DatedItem`]s.
    pub fn allocate_items(&self, items: &[DatedItem]) -> Result<AllocationTable> {
        let starts: Array1<NaiveDate> = items.iter().map(|i| i.start).collect();
        let lengths: Array1<i64> = items.iter().map(|i| i.length).collect();
        self.allocate_many(starts.view(), lengths.view())
    }

    /// Sum of `amount * allocation` in each period over a list of dated amounts, e.g. the hours
    /// of labour required in each labour period.
    pub fn period_totals(&self, items: &[(DatedItem, f64)]) -> Result<Array1<f64>> {
        let mut totals = Array1::<f64>::zeros(self.taxonomy.len());
        for (item, amount) in items.iter() {
            let alloc = self.allocate_item(item)?;
            totals.scaled_add(*amount, &alloc);
        }
        Ok(totals)
    }
}
